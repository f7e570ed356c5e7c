use anyhow::Context;
use canis_core::{
    AssetResolver, CanisConfig, MemoryStore, StateStore, SystemClock, TimeScale,
};
use canis_limbic::StateManager;
use canis_memory::SqliteStore;
use canis_reasoning::PetRuntime;
use clap::Parser;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod logging;
mod repl;
mod video;

use repl::ReplCommand;
use video::VideoLibrary;

#[derive(Parser, Debug)]
#[command(author, version, about = "A virtual dog that lives in your terminal", long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml", env = "CANIS_CONFIG")]
    config: PathBuf,

    /// Path to the state database (overrides config)
    #[arg(short, long)]
    db: Option<PathBuf>,

    /// Virtual minutes per real minute (overrides config)
    #[arg(short, long)]
    time_scale: Option<f64>,

    /// LLM provider: deepseek, openai or mock (overrides config)
    #[arg(long)]
    provider: Option<String>,

    /// Model name (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Keep state in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Serve the HTTP gateway
    #[arg(long)]
    gateway: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Also write daily rolling log files here
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

enum Input {
    Line(String),
    Quit,
}

/// Read lines on a dedicated thread; rustyline blocks.
fn spawn_reader(tx: mpsc::Sender<Input>) -> anyhow::Result<()> {
    let mut editor = rustyline::DefaultEditor::new().context("Failed to start line editor")?;
    std::thread::Builder::new()
        .name("canis-repl".into())
        .spawn(move || loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if tx.blocking_send(Input::Line(line)).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    let _ = tx.blocking_send(Input::Quit);
                    break;
                }
                Err(e) => {
                    error!("Readline error: {}", e);
                    let _ = tx.blocking_send(Input::Quit);
                    break;
                }
            }
        })
        .context("Failed to spawn input thread")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = logging::init(args.log_json, args.log_dir.as_deref());

    info!("Initializing Canis...");

    // 1. Config
    let mut config = CanisConfig::load_or_default(&args.config);
    if let Some(db) = args.db {
        config.simulation.db_path = db;
    }
    if let Some(scale) = args.time_scale {
        config.simulation.time_scale = scale;
    }
    if let Some(provider) = args.provider {
        config.llm.provider = provider;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    let scale = TimeScale::new(config.simulation.time_scale).context("Invalid time scale")?;

    // 2. Persistence
    let store: Arc<dyn StateStore> = if args.ephemeral {
        info!("Ephemeral mode: state lives in memory only");
        Arc::new(MemoryStore::new())
    } else {
        info!("Opening state at {}...", config.simulation.db_path.display());
        Arc::new(SqliteStore::new(&config.simulation.db_path).await?)
    };

    // 3. State
    let state = Arc::new(
        StateManager::load(
            store,
            Arc::new(SystemClock),
            config.dynamics.clone(),
            scale,
        )
        .await?,
    );

    // 4. Agent and loops
    let client = canis_reasoning::providers::from_config(&config.llm)?;
    let videos: Arc<dyn AssetResolver> = Arc::new(VideoLibrary::new(&config.simulation.asset_dir));
    let runtime = PetRuntime::start(state.clone(), client, videos.clone(), &config);

    // 5. Gateway
    #[cfg(feature = "gateway")]
    let gateway = if args.gateway || config.gateway.enabled {
        let server = canis_gateway::GatewayServer::new(
            runtime.orchestrator.clone(),
            videos.clone(),
            &config.gateway.host,
            config.gateway.port,
        );
        Some(server.start())
    } else {
        None
    };
    #[cfg(not(feature = "gateway"))]
    if args.gateway {
        warn!("Built without the gateway feature, --gateway ignored");
    }

    println!("🐕 Canis is awake ({}x time). Type /help for commands.", scale.factor());
    println!("{}", state.status_text().await);

    let (tx, mut rx) = mpsc::channel(16);
    spawn_reader(tx)?;

    loop {
        tokio::select! {
            input = rx.recv() => {
                let line = match input {
                    Some(Input::Line(line)) => line,
                    Some(Input::Quit) | None => break,
                };
                let command = ReplCommand::parse(&line);
                let ctrl_c = async {
                    let _ = tokio::signal::ctrl_c().await;
                };
                match repl::execute_or_shutdown(&runtime.orchestrator, command, ctrl_c).await {
                    Some(text) if !text.is_empty() => println!("{text}"),
                    Some(_) => {}
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
        }
    }

    info!("Shutting down...");
    #[cfg(feature = "gateway")]
    if let Some(handle) = gateway {
        handle.abort();
    }
    if let Err(e) = runtime.shutdown().await {
        warn!("Final save failed: {:#}", e);
        return Err(e);
    }
    println!("Bye! 🐾");
    Ok(())
}

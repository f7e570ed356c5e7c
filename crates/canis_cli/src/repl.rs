use canis_reasoning::agent_loop::Speaker;
use canis_reasoning::Orchestrator;
use std::future::Future;

pub const HELP: &str = "Talk to your dog, or use a command:
  /status        attributes
  /progress      current long behavior
  /queue         what is running and waiting
  /scale <x>     set the time scale (virtual minutes per real minute)
  /interrupt     wake the dog / stop the current behavior
  /history       conversation so far
  /help          this text
  /quit          save and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Say(String),
    Status,
    Progress,
    Queue,
    Scale(f64),
    Interrupt,
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if matches!(line, "quit" | "exit") {
            return Self::Quit;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or_default() {
            "status" => Self::Status,
            "progress" => Self::Progress,
            "queue" => Self::Queue,
            "interrupt" => Self::Interrupt,
            "history" => Self::History,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "scale" => match parts.next().map(str::parse::<f64>) {
                Some(Ok(x)) => Self::Scale(x),
                Some(Err(_)) => Self::Invalid("/scale expects a number, e.g. /scale 60".into()),
                None => Self::Invalid("usage: /scale <x>".into()),
            },
            other => Self::Invalid(format!("Unknown command /{other} (try /help)")),
        }
    }
}

/// Run one command and render its output. `None` means quit.
pub async fn execute(orchestrator: &Orchestrator, command: ReplCommand) -> Option<String> {
    let state = orchestrator.state();
    let text = match command {
        ReplCommand::Quit => return None,
        ReplCommand::Empty => String::new(),
        ReplCommand::Help => HELP.to_string(),
        ReplCommand::Invalid(msg) => msg,
        ReplCommand::Status => state.status_text().await,
        ReplCommand::Progress => match state.behavior_progress().await {
            Some(p) if state.is_busy().await => format!(
                "{}: {:.1}% ({:.1} of {:.1} minutes, {:.1} left)",
                p.description, p.percent, p.elapsed_minutes, p.total_minutes, p.remaining_minutes
            ),
            _ => "Not doing anything long right now.".to_string(),
        },
        ReplCommand::Queue => {
            let queue = orchestrator.queue();
            match queue.executing() {
                Some(current) => format!("Executing: {} ({} waiting)", current, queue.pending()),
                None => format!("Idle ({} waiting)", queue.pending()),
            }
        }
        ReplCommand::Scale(x) => match state.set_time_scale(x).await {
            Ok(scale) => format!("Time scale set to {}x", scale.factor()),
            Err(e) => format!("Error: {e}"),
        },
        ReplCommand::Interrupt => match state.interrupt_behavior("interrupted by owner").await {
            Ok(message) => message,
            Err(e) => format!("Nothing to do: {e}"),
        },
        ReplCommand::History => orchestrator
            .transcript()
            .iter()
            .map(|e| {
                let who = match e.speaker {
                    Speaker::Owner => "You",
                    Speaker::Dog => "🐕",
                };
                format!("[{}] {}: {}", e.at.format("%H:%M:%S"), who, e.text)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ReplCommand::Say(line) => match orchestrator.handle_user_input(&line).await {
            Ok(reply) => format!("🐕 {reply}"),
            Err(e) => {
                tracing::error!("Interactive cycle failed: {:#}", e);
                format!("[System Error]: {e:#}")
            }
        },
    };
    Some(text)
}

/// Like [`execute`], but gives up as soon as `shutdown` resolves so a long
/// cycle cannot hold the process open. `None` means quit.
pub async fn execute_or_shutdown<F>(
    orchestrator: &Orchestrator,
    command: ReplCommand,
    shutdown: F,
) -> Option<String>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        out = execute(orchestrator, command) => out,
        _ = shutdown => {
            tracing::info!("Shutdown requested while a command was running");
            None
        }
    }
}

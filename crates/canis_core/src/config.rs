use crate::dynamics::NeedDynamics;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CanisConfig {
    pub llm: LlmConfig,
    pub simulation: SimulationConfig,
    pub timing: TimingConfig,
    pub dynamics: NeedDynamics,
    pub gateway: GatewayConfig,
}

impl CanisConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: CanisConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("CANIS_TIME_SCALE") {
            match v.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 => self.simulation.time_scale = n,
                _ => tracing::warn!("Ignoring invalid CANIS_TIME_SCALE={}", v),
            }
        }
        if let Ok(v) = std::env::var("CANIS_DB_PATH") {
            self.simulation.db_path = PathBuf::from(v);
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `deepseek`, `openai` or `mock`.
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on tool-use rounds within one cycle.
    pub max_tool_rounds: usize,
    /// How many past messages are replayed to the model.
    pub history_messages: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            max_tokens: 1024,
            temperature: 0.7,
            max_tool_rounds: 4,
            history_messages: 40,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Virtual minutes per real minute.
    pub time_scale: f64,
    pub db_path: PathBuf,
    pub asset_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 30.0,
            db_path: PathBuf::from("canis.db"),
            asset_dir: PathBuf::from("video"),
        }
    }
}

/// Loop intervals, all in real seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_interval_secs: f64,
    pub autonomous_interval_secs: f64,
    pub queue_idle_secs: f64,
    pub completion_poll_secs: f64,
    pub error_backoff_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 3.0,
            autonomous_interval_secs: 15.0,
            queue_idle_secs: 0.5,
            completion_poll_secs: 1.0,
            error_backoff_secs: 1.0,
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        secs(self.tick_interval_secs)
    }

    pub fn autonomous_interval(&self) -> Duration {
        secs(self.autonomous_interval_secs)
    }

    pub fn queue_idle(&self) -> Duration {
        secs(self.queue_idle_secs)
    }

    pub fn completion_poll(&self) -> Duration {
        secs(self.completion_poll_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        secs(self.error_backoff_secs)
    }
}

/// Longest loop interval accepted from config.
const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Non-finite or negative values collapse to a 10ms floor so loops never spin;
/// huge values are capped at one day.
fn secs(value: f64) -> Duration {
    if !(value.is_finite() && value > 0.0) {
        return Duration::from_millis(10);
    }
    match Duration::try_from_secs_f64(value.max(0.01)) {
        Ok(d) => d.min(MAX_INTERVAL),
        Err(_) => {
            tracing::warn!("Interval of {}s is out of range, using {:?}", value, MAX_INTERVAL);
            MAX_INTERVAL
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

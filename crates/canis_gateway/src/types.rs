use canis_core::state::{BehaviorProgress, PetState};
use canis_reasoning::TranscriptEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound owner message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    /// What the owner says or does.
    pub body: String,
    /// Optional author name, only used for logging.
    #[serde(default)]
    pub author: Option<String>,
}

/// Reply to an owner message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub request_id: Uuid,
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeScaleRequest {
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeScaleResponse {
    pub scale: f64,
}

/// Everything a presentation layer polls.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub state: PetState,
    pub busy: bool,
    pub progress: Option<BehaviorProgress>,
    /// Task the queue worker is running right now.
    pub executing: Option<String>,
    pub pending: usize,
    pub current_asset: Option<String>,
    pub time_scale: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub entries: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

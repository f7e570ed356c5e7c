use crate::types::{
    ErrorBody, MessageRequest, MessageResponse, StatusResponse, TimeScaleRequest,
    TimeScaleResponse, TranscriptResponse,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use canis_core::AssetResolver;
use canis_reasoning::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Upper bound on one interactive cycle served over HTTP.
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    assets: Arc<dyn AssetResolver>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
}

/// The gateway HTTP server.
///
/// Lets a presentation layer observe and talk to the dog:
/// - `GET /health` health check
/// - `GET /status` attributes, activity and queue
/// - `GET /transcript` chat log
/// - `POST /message` owner input, answered synchronously
/// - `POST /time-scale` change the real-to-virtual multiplier
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        assets: Arc<dyn AssetResolver>,
        host: &str,
        port: u16,
    ) -> Self {
        Self {
            state: AppState {
                orchestrator,
                assets,
            },
            host: host.to_string(),
            port,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/status", get(status))
            .route("/transcript", get(transcript))
            .route("/message", post(handle_message))
            .route("/time-scale", post(set_time_scale))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the server. This spawns a background task and returns the join handle.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        let app = self.router();
        let addr = format!("{}:{}", self.host, self.port);

        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Gateway failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Gateway listening on {}", addr);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        })
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

/// GET /status
async fn status(State(app): State<AppState>) -> Json<StatusResponse> {
    let manager = app.orchestrator.state();
    let state = manager.refresh().await;
    let progress = manager.behavior_progress().await;
    let busy = manager.is_busy().await;
    let time_scale = manager.time_scale().await.factor();
    let queue = app.orchestrator.queue();

    Json(StatusResponse {
        state,
        busy,
        progress: progress.filter(|_| busy),
        executing: queue.executing(),
        pending: queue.pending(),
        current_asset: app.assets.current().map(|p| p.display().to_string()),
        time_scale,
    })
}

/// GET /transcript
async fn transcript(State(app): State<AppState>) -> Json<TranscriptResponse> {
    Json(TranscriptResponse {
        entries: app.orchestrator.transcript(),
    })
}

/// POST /message
///
/// Runs an interactive cycle and answers with the dog's reply.
async fn handle_message(
    State(app): State<AppState>,
    Json(msg): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let body = msg.body.trim();
    if body.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "body must not be empty"));
    }
    if !app.orchestrator.is_running() {
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "shutting down"));
    }

    let request_id = Uuid::new_v4();
    tracing::info!(
        "Gateway message {} from {}: {}",
        request_id,
        msg.author.as_deref().unwrap_or("owner"),
        body
    );

    match tokio::time::timeout(MESSAGE_TIMEOUT, app.orchestrator.handle_user_input(body)).await {
        Ok(Ok(reply)) => Ok(Json(MessageResponse { request_id, reply })),
        Ok(Err(e)) => {
            tracing::warn!("Gateway message {} failed: {:#}", request_id, e);
            Err(api_error(StatusCode::BAD_GATEWAY, format!("{:#}", e)))
        }
        Err(_) => Err(api_error(StatusCode::GATEWAY_TIMEOUT, "timeout")),
    }
}

/// POST /time-scale
async fn set_time_scale(
    State(app): State<AppState>,
    Json(req): Json<TimeScaleRequest>,
) -> Result<Json<TimeScaleResponse>, ApiError> {
    app.orchestrator
        .state()
        .set_time_scale(req.scale)
        .await
        .map(|scale| {
            Json(TimeScaleResponse {
                scale: scale.factor(),
            })
        })
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

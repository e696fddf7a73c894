use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use kaiwa_conversation::TurnEngine;
use kaiwa_core::{ConversationStore, LLMProvider};

use crate::{LineClient, Result, WebhookPayload, handler::handle_event, signature};

/// Engine wiring used by the server: trait objects injected at startup.
pub type SharedEngine = TurnEngine<Arc<dyn LLMProvider>, Arc<dyn ConversationStore>>;

/// Dependency-injection context for the webhook server.
///
/// Built once at startup and cloned per request; no ambient globals.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<SharedEngine>,
    line: Arc<LineClient>,
    channel_secret: String,
    reset_keyword: String,
}

impl AppState {
    #[must_use]
    pub fn new(
        engine: SharedEngine,
        line: LineClient,
        channel_secret: String,
        reset_keyword: String,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            line: Arc::new(line),
            channel_secret,
            reset_keyword,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    #[must_use]
    pub fn line(&self) -> &LineClient {
        &self.line
    }

    #[must_use]
    pub fn reset_keyword(&self) -> &str {
        &self.reset_keyword
    }
}

/// Bind and serve the webhook endpoints until the process exits.
pub async fn run(state: AppState, port: u16) -> Result<()> {
    let app = Router::new()
        .route("/", get(health))
        .route("/callback", post(callback))
        .with_state(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Webhook server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    axum::Json(json!({ "message": "AI Conversation LINE Bot API is running." }))
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let sig_header = headers
        .get("X-Line-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !signature::verify(&state.channel_secret, &body, sig_header) {
        warn!("Rejected webhook request: invalid signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!("Rejected webhook request: malformed payload: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    for event in payload.events {
        handle_event(&state, event).await;
    }

    (StatusCode::OK, "OK").into_response()
}

//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for loading content into a conversation, asking
//! follow-up questions, and fetching synthesized audio.

use crate::cli::Output;
use crate::conversation::SessionStore;
use crate::error::RecapError;
use crate::orchestrator::{Orchestrator, ProcessOptions};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    sessions: SessionStore,
    audio_dir: PathBuf,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, orchestrator: Orchestrator) -> anyhow::Result<()> {
    let audio_dir = orchestrator.settings().output_dir();
    std::fs::create_dir_all(&audio_dir)?;

    let state = Arc::new(AppState {
        orchestrator,
        sessions: SessionStore::new(),
        audio_dir,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/load", post(load))
        .route("/chat", post(chat))
        .route("/sessions/{id}", axum::routing::delete(delete_session))
        .route("/sessions/{id}/clear", post(clear_session))
        .route("/audio/{file}", get(audio))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Recap API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Load content", "POST   /load");
    Output::kv("Ask question", "POST   /chat");
    Output::kv("Clear session", "POST   /sessions/:id/clear");
    Output::kv("End session", "DELETE /sessions/:id");
    Output::kv("Audio", "GET    /audio/:file");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct LoadRequest {
    /// Web URL, YouTube URL/ID, or text file path
    input: String,
    #[serde(default)]
    speak: bool,
}

#[derive(Serialize)]
struct LoadResponse {
    session_id: Uuid,
    title: String,
    source_url: String,
    text: String,
    original_chars: usize,
    condensed_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_error: Option<String>,
}

#[derive(Deserialize)]
struct ChatRequest {
    session_id: Uuid,
    message: String,
    #[serde(default)]
    speak: bool,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_error: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// HTTP status for a pipeline error.
fn status_for(err: &RecapError) -> StatusCode {
    match err {
        RecapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RecapError::Fetch(_)
        | RecapError::BackendUnavailable(_)
        | RecapError::ContractViolation { .. }
        | RecapError::OpenAI(_)
        | RecapError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn file_name(path: &std::path::Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(|n| n.to_string())
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn load(State(state): State<Arc<AppState>>, Json(req): Json<LoadRequest>) -> Response {
    let options = ProcessOptions {
        speak: req.speak,
        save: false,
    };
    let result = match state.orchestrator.process(&req.input, options).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Failed to load {}: {}", req.input, e);
            return error_response(status_for(&e), e.to_string());
        }
    };

    let session = state.orchestrator.conversation().start(&result.text);
    let session_id = state.sessions.create(session).await;
    info!("Session {} loaded from {}", session_id, result.source_url);

    Json(LoadResponse {
        session_id,
        title: result.title,
        source_url: result.source_url,
        original_chars: result.original_chars,
        condensed_chars: result.condensed_chars,
        text: result.text,
        audio_file: result.audio_path.as_deref().and_then(file_name),
        speech_error: result.speech_error,
    })
    .into_response()
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let Some(session) = state.sessions.get(&req.session_id).await else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Session not found: {}", req.session_id),
        );
    };

    let answer = {
        let mut session = session.lock().await;
        match state
            .orchestrator
            .conversation()
            .ask(&mut session, &req.message)
            .await
        {
            Ok(answer) => answer,
            Err(e) => return error_response(status_for(&e), e.to_string()),
        }
    };

    let (audio_file, speech_error) = if req.speak {
        match state.orchestrator.speak(&answer).await {
            Ok(path) => (file_name(&path), None),
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                (None, Some(e.to_string()))
            }
        }
    } else {
        (None, None)
    };

    Json(ChatResponse {
        answer,
        audio_file,
        speech_error,
    })
    .into_response()
}

async fn clear_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.clear(&id).await {
        Json(serde_json::json!({ "status": "cleared" })).into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
    }
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.remove(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
    }
}

async fn audio(State(state): State<Arc<AppState>>, Path(file): Path<String>) -> Response {
    if !is_safe_file_name(&file) {
        return error_response(StatusCode::BAD_REQUEST, format!("Invalid file name: {}", file));
    }

    match tokio::fs::read(state.audio_dir.join(&file)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type_for(&file))], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(StatusCode::NOT_FOUND, format!("Audio file not found: {}", file))
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// A bare file name that cannot escape the audio directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn content_type_for(file: &str) -> &'static str {
    match file.rsplit('.').next().unwrap_or_default() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "opus" => "audio/ogg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

//! HTTP endpoints for question generation.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::questions::model::Question;
use crate::questions::source::Mode;

use super::fallback::{clamp_count, fallback_questions};
use super::generator::QuestionGenerator;

/// Shared state for generation routes.
#[derive(Clone)]
pub struct GenerationState {
    /// `None` when no API key is configured; every request then falls back.
    pub generator: Option<Arc<QuestionGenerator>>,
    pub bank: Arc<[Question]>,
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// POST /api/onboarding/questions
///
/// Always answers with a question list: generated when possible, otherwise a
/// deterministic sample of the bank tagged `"fallback"`.
async fn generate_questions(
    State(state): State<GenerationState>,
    body: Bytes,
) -> impl IntoResponse {
    let payload: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid JSON body" })),
                )
                    .into_response();
            }
        }
    };

    let request_id = Uuid::new_v4();
    let count = clamp_count(payload.get("count"));
    let context = payload.get("context").cloned().unwrap_or_else(|| json!({}));
    let regen_seed = payload.get("regenSeed").cloned().unwrap_or_else(|| json!(0));
    let mode = Mode::from_label(payload.get("mode").and_then(Value::as_str).unwrap_or("batch"));
    let exclude_prompts = string_list(payload.get("excludePrompts"));
    let target = match mode {
        Mode::Batch => count,
        Mode::Single => 1,
    };

    info!(%request_id, ?mode, count = target, "Question request");

    match &state.generator {
        Some(generator) => {
            match generator
                .generate(target, &context, mode, &exclude_prompts)
                .await
            {
                Ok(questions) => {
                    return Json(json!({ "questions": questions, "source": "openrouter" }))
                        .into_response();
                }
                Err(e) => warn!(%request_id, error = %e, "Generation failed, serving fallback"),
            }
        }
        None => warn!(%request_id, "No generator configured, serving fallback"),
    }

    let questions = fallback_questions(
        &state.bank,
        target,
        &context,
        &regen_seed,
        mode,
        &exclude_prompts,
    );
    Json(json!({ "questions": questions, "source": "fallback" })).into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// Build the generation routes with permissive CORS.
pub fn generation_routes(state: GenerationState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/questions", post(generate_questions))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

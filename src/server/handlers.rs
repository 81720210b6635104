use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ModelError, PredictionError};
use crate::server::types::*;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn render_metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}

/// `POST /predict`. The body is parsed as JSON regardless of content type.
/// Errors, including a body that could not be read, are reported in the body
/// with a 200 status unless the server runs with strict status codes.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();

    let outcome = match body {
        Ok(body) => {
            // Inference is CPU-bound and may block on the session lock.
            let service = state.service.clone();
            tokio::task::spawn_blocking(move || service.try_predict_json(&body))
                .await
                .unwrap_or_else(|e| Err(ModelError::Panicked(e.to_string()).into()))
        }
        Err(rejection) => Err(PredictionError::Transport(rejection.body_text())),
    };

    histogram!("inference_duration_seconds", start.elapsed().as_secs_f64());

    match outcome {
        Ok(predicted_goals) => {
            counter!("predictions_total", 1, "status" => "success");
            Json(PredictionResult::Success { predicted_goals }).into_response()
        }
        Err(e) => {
            counter!("predictions_total", 1, "status" => "error", "kind" => e.kind());
            tracing::warn!(kind = e.kind(), error = %e, "prediction failed");
            error_response(e, state.strict_status_codes)
        }
    }
}

fn error_response(e: PredictionError, strict: bool) -> Response {
    if strict {
        e.into_response()
    } else {
        (StatusCode::OK, Json(PredictionResult::from(e))).into_response()
    }
}

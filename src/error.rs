use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use thiserror::Error;

use crate::server::types::PredictionResult;

/// Raised by feature derivation when the raw record does not carry the
/// required statistics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required field: '{0}'")]
    MissingField(String),

    #[error("Field '{field}' must be a number or null, got {found}")]
    NotNumeric { field: String, found: &'static str },
}

/// Raised by the model collaborator, while loading it or while running it.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("Model input column '{0}' is missing from the record")]
    MissingColumn(String),

    #[error("Model input column '{column}' must be numeric, got {found}")]
    NotNumeric { column: String, found: &'static str },

    #[error("Model input column '{column}' must be a category string, got {found}")]
    NotCategorical { column: String, found: &'static str },

    #[error("Model session declares no inputs")]
    NoInputs,

    #[error("Model returned no predictions")]
    EmptyOutput,

    #[error("Model returned {got} predictions for {expected} rows")]
    RowCountMismatch { expected: usize, got: usize },

    #[error("Model returned a non-finite prediction: {0}")]
    NonFinite(f64),

    #[error("Inference task failed: {0}")]
    Panicked(String),
}

/// Everything that can turn a `/predict` call into an error-shaped result.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Model invocation error: {0}")]
    Model(#[from] ModelError),

    #[error("Malformed request body: {0}")]
    Transport(String),
}

impl PredictionError {
    /// Short label used for logs and the `status` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::Schema(_) => "schema",
            PredictionError::Model(_) => "model",
            PredictionError::Transport(_) => "transport",
        }
    }

    /// Status code used when the server runs with `strict_status_codes`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictionError::Schema(_) | PredictionError::Transport(_) => StatusCode::BAD_REQUEST,
            PredictionError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for PredictionError {
    fn from(e: serde_json::Error) -> Self {
        PredictionError::Transport(e.to_string())
    }
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(PredictionResult::from(self));
        (status, body).into_response()
    }
}

use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};

use crate::error::PredictionError;
use crate::service::PredictionService;

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub metrics: PrometheusHandle,
    pub strict_status_codes: bool,
}

// --- DTOs (Data Transfer Objects) ---

/// Body of every `/predict` response. The `status` tag tells the two shapes
/// apart:
///
/// ```json
/// {"predicted_goals": 3.46, "status": "success"}
/// {"error": "Schema error: Missing required field: 'Shots'", "status": "error"}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PredictionResult {
    Success { predicted_goals: f64 },
    Error { error: String },
}

impl PredictionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResult::Success { .. })
    }
}

impl From<PredictionError> for PredictionResult {
    fn from(e: PredictionError) -> Self {
        PredictionResult::Error {
            error: e.to_string(),
        }
    }
}

//! Request orchestration: derive features, run the model, shape the result.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ModelError, PredictionError};
use crate::model::GoalModel;
use crate::preprocessing::{derive, RawPlayerRecord};
use crate::server::types::PredictionResult;

/// Rounds to two decimals, ties to even on the scaled value.
///
/// `0.125` becomes `0.12` and `0.375` becomes `0.38`. Values whose decimal
/// spelling looks like a tie but is stored just below it (`2.345`) round down.
pub fn round_goals(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[derive(Clone)]
pub struct PredictionService {
    model: Arc<dyn GoalModel>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn GoalModel>) -> Self {
        Self { model }
    }

    /// Predicts goals for one record. Never fails; errors come back as the
    /// error-shaped result.
    pub fn predict(&self, raw: RawPlayerRecord) -> PredictionResult {
        Self::finish(self.try_predict(raw))
    }

    /// Like [`predict`](Self::predict), starting from an unparsed body.
    /// The body is read as JSON whatever its declared content type.
    pub fn predict_json(&self, body: &[u8]) -> PredictionResult {
        Self::finish(self.try_predict_json(body))
    }

    pub fn try_predict_json(&self, body: &[u8]) -> Result<f64, PredictionError> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let raw = RawPlayerRecord::try_from(value).map_err(|found| {
            PredictionError::Transport(format!("expected a JSON object, got {}", found))
        })?;
        self.try_predict(raw)
    }

    pub fn try_predict(&self, raw: RawPlayerRecord) -> Result<f64, PredictionError> {
        let enriched = derive(raw)?;
        debug!(
            ninety_s = %enriched.ninety_s,
            shots_p90 = %enriched.shots_p90,
            goals_missed_pct = %enriched.goals_missed_pct,
            "derived features"
        );

        let predictions = self.model.predict(std::slice::from_ref(&enriched))?;
        let predicted = *predictions.first().ok_or(ModelError::EmptyOutput)?;
        // Scaling by 100 overflows near f64::MAX, so check after rounding.
        let rounded = round_goals(predicted);
        if !rounded.is_finite() {
            return Err(ModelError::NonFinite(predicted).into());
        }
        Ok(rounded)
    }

    fn finish(outcome: Result<f64, PredictionError>) -> PredictionResult {
        match outcome {
            Ok(predicted_goals) => PredictionResult::Success { predicted_goals },
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "prediction failed");
                PredictionResult::from(e)
            }
        }
    }
}

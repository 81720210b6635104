pub mod loader;
pub mod onnx;

use crate::error::ModelError;
use crate::preprocessing::EnrichedPlayerRecord;

pub use onnx::OnnxGoalModel;

/// A trained goal regressor.
///
/// Implementations do their own imputation and scaling; callers only
/// guarantee the engineered columns are present and correct. The service
/// holds one instance for the process lifetime and may call it from several
/// threads, so an implementation that cannot run concurrently must serialize
/// internally.
pub trait GoalModel: Send + Sync {
    /// Returns one prediction per row, in row order.
    fn predict(&self, rows: &[EnrichedPlayerRecord]) -> Result<Vec<f64>, ModelError>;
}

pub mod config;
pub mod error;
pub mod model;
pub mod preprocessing;
pub mod server;
pub mod service;
pub mod telemetry;


// Re-export common types
pub use error::{ModelError, PredictionError, SchemaError};
pub use model::GoalModel;
pub use preprocessing::{derive, EnrichedPlayerRecord, Measure, RawPlayerRecord};
pub use server::types::PredictionResult;
pub use service::PredictionService;

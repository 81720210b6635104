use crate::config::ModelConfig;
use crate::error::ModelError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

use super::onnx::OnnxGoalModel;

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), ModelError> {
    ort::init().with_name("goalcast").commit()?;
    Ok(())
}

/// Opens an ONNX file and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
/// * `intra_threads` - Parallelism within a single operator
pub fn load_session(
    model_path: impl AsRef<Path>,
    intra_threads: usize,
) -> Result<Session, ModelError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(ModelError::ModelNotFound(path.display().to_string()));
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;

    info!(path = %path.display(), "loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        info!(index = i, name = %input.name, kind = ?input.input_type, "model input");
    }

    Ok(session)
}

/// Loads the goal model described by `config`, ready to serve.
pub fn load_model(config: &ModelConfig) -> Result<OnnxGoalModel, ModelError> {
    let session = load_session(&config.path, config.intra_threads)?;
    OnnxGoalModel::new(session, config.features.clone(), config.input_name.clone())
}

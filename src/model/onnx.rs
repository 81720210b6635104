//! ONNX Runtime adapter for the exported goal pipeline.
//!
//! The pipeline is exported with a single float input of shape
//! `[rows, width]`. Columns are laid out in configuration order; categorical
//! columns are one-hot encoded here because the exported graph only takes
//! floats. Missing values are passed as NaN for the graph's imputer.

use ndarray::Array2;
use ort::session::Session;
use ort::value::{DynValue, Tensor};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::GoalModel;
use crate::config::FeatureColumn;
use crate::error::ModelError;
use crate::preprocessing::player::json_type;
use crate::preprocessing::{EnrichedPlayerRecord, Measure};

pub struct OnnxGoalModel {
    // Inference takes `&mut Session`; the lock serializes concurrent requests.
    session: Mutex<Session>,
    input_name: String,
    columns: Vec<FeatureColumn>,
}

impl OnnxGoalModel {
    pub fn new(
        session: Session,
        columns: Vec<FeatureColumn>,
        input_name: Option<String>,
    ) -> Result<Self, ModelError> {
        let input_name = match input_name {
            Some(name) => name,
            None => session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or(ModelError::NoInputs)?,
        };

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            columns,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }
}

impl GoalModel for OnnxGoalModel {
    fn predict(&self, rows: &[EnrichedPlayerRecord]) -> Result<Vec<f64>, ModelError> {
        let features = feature_matrix(rows, &self.columns)?;
        let shape = features.shape().to_vec();
        let (data, _) = features.into_raw_vec_and_offset();
        let input_value = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let mut session = lock_session(&self.session);
        let outputs = session.run(ort::inputs![self.input_name.clone() => input_value])?;
        let predictions = extract_predictions(&outputs[0])?;

        if predictions.len() != rows.len() {
            return Err(ModelError::RowCountMismatch {
                expected: rows.len(),
                got: predictions.len(),
            });
        }
        debug!(rows = rows.len(), "ran goal model");
        Ok(predictions)
    }
}

// A panic mid-inference leaves nothing in the session half-updated, so the
// next request keeps using it.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lays out `rows` as a `[rows, width]` matrix following `columns`.
pub fn feature_matrix(
    rows: &[EnrichedPlayerRecord],
    columns: &[FeatureColumn],
) -> Result<Array2<f32>, ModelError> {
    let width: usize = columns.iter().map(FeatureColumn::width).sum();
    let mut data = Vec::with_capacity(rows.len() * width);

    for row in rows {
        for column in columns {
            match &column.categories {
                None => data.push(numeric(row, &column.column)?.to_f32()),
                Some(categories) => one_hot(row, &column.column, categories, &mut data)?,
            }
        }
    }

    Ok(Array2::from_shape_vec((rows.len(), width), data)?)
}

fn numeric(row: &EnrichedPlayerRecord, column: &str) -> Result<Measure, ModelError> {
    if let Some(measure) = row.derived(column) {
        return Ok(measure);
    }
    match row.raw().get(column) {
        None => Err(ModelError::MissingColumn(column.to_string())),
        Some(Value::Null) => Ok(Measure::MISSING),
        Some(Value::Number(n)) => Ok(Measure::from(n.as_f64())),
        Some(other) => Err(ModelError::NotNumeric {
            column: column.to_string(),
            found: json_type(other),
        }),
    }
}

// Unknown or null categories encode as all zeros.
fn one_hot(
    row: &EnrichedPlayerRecord,
    column: &str,
    categories: &[String],
    out: &mut Vec<f32>,
) -> Result<(), ModelError> {
    let selected = match row.raw().get(column) {
        None => return Err(ModelError::MissingColumn(column.to_string())),
        Some(Value::Null) => None,
        Some(Value::String(s)) => categories.iter().position(|c| c == s),
        Some(other) => {
            return Err(ModelError::NotCategorical {
                column: column.to_string(),
                found: json_type(other),
            })
        }
    };
    out.extend((0..categories.len()).map(|i| if Some(i) == selected { 1.0 } else { 0.0 }));
    Ok(())
}

/// Flattens the first output into one value per row. Regressors exported in
/// single precision emit f32; double-precision exports emit f64.
fn extract_predictions(output: &DynValue) -> Result<Vec<f64>, ModelError> {
    if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
        return Ok(data.iter().map(|&v| v as f64).collect());
    }
    let (_, data) = output.try_extract_tensor::<f64>()?;
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::loader::load_session;
    use crate::preprocessing::{derive, RawPlayerRecord};
    use serde_json::json;

    fn enriched(value: Value) -> EnrichedPlayerRecord {
        derive(RawPlayerRecord::try_from(value).unwrap()).unwrap()
    }

    fn forward() -> EnrichedPlayerRecord {
        enriched(json!({
            "Position": "Forward",
            "Age": 27,
            "Appearances": 20,
            "Shots": 40,
            "Shots on target": 20,
            "Shooting accuracy %": 50,
        }))
    }

    fn positions() -> FeatureColumn {
        FeatureColumn::categorical("Position", &["Defender", "Forward", "Goalkeeper", "Midfielder"])
    }

    #[test]
    fn test_matrix_layout() {
        let columns = vec![
            FeatureColumn::numeric("Age"),
            FeatureColumn::numeric("90s"),
            FeatureColumn::numeric("Shots_p90"),
            FeatureColumn::numeric("Goals_missed_%"),
            positions(),
        ];
        let matrix = feature_matrix(&[forward()], &columns).unwrap();
        assert_eq!(matrix.shape(), &[1, 8]);
        assert_eq!(
            matrix.row(0).to_vec(),
            vec![27.0, 1800.0, 2.0, 10000.0, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_missing_values_become_nan() {
        let row = enriched(json!({
            "Appearances": 3,
            "Shots": 9,
            "Shots on target": 0,
            "Shooting accuracy %": null,
        }));
        let columns = vec![
            FeatureColumn::numeric("Shooting accuracy %"),
            FeatureColumn::numeric("Goals_missed_%"),
        ];
        let matrix = feature_matrix(&[row], &columns).unwrap();
        assert!(matrix[[0, 0]].is_nan());
        assert!(matrix[[0, 1]].is_nan());
    }

    #[test]
    fn test_unknown_category_is_all_zeros() {
        let row = enriched(json!({
            "Position": "Winger",
            "Appearances": 1,
            "Shots": 1,
            "Shots on target": 1,
            "Shooting accuracy %": 100,
        }));
        let matrix = feature_matrix(&[row], &[positions()]).unwrap();
        assert!(matrix.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_missing_column_is_error() {
        let row = enriched(json!({
            "Appearances": 1,
            "Shots": 1,
            "Shots on target": 1,
            "Shooting accuracy %": 100,
        }));
        let err = feature_matrix(&[row.clone()], &[FeatureColumn::numeric("Age")]).unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(ref c) if c == "Age"));

        let err = feature_matrix(&[row], &[positions()]).unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(ref c) if c == "Position"));
    }

    #[test]
    fn test_wrong_types_are_errors() {
        let row = forward();
        let err = feature_matrix(&[row.clone()], &[FeatureColumn::numeric("Position")]).unwrap_err();
        assert!(matches!(err, ModelError::NotNumeric { found: "string", .. }));

        let err = feature_matrix(&[row], &[FeatureColumn::categorical("Age", &["27"])]).unwrap_err();
        assert!(matches!(err, ModelError::NotCategorical { found: "number", .. }));
    }

    #[test]
    fn test_lock_survives_panic_while_held() {
        let session = std::sync::Arc::new(Mutex::new(7u32));
        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("inference blew up");
        })
        .join();
        assert!(session.is_poisoned());

        assert_eq!(*lock_session(&session), 7);
        *lock_session(&session) += 1;
        assert_eq!(*lock_session(&session), 8);
    }

    #[test]
    fn test_multiple_rows() {
        let columns = vec![FeatureColumn::numeric("Shots")];
        let matrix = feature_matrix(&[forward(), forward(), forward()], &columns).unwrap();
        assert_eq!(matrix.shape(), &[3, 1]);
    }

    // Graphs written by tests/fixtures/make_onnx_fixtures.py. Each takes
    // `float_input` [N, 2]; the linear ones compute `x0 + 0.5 * x1`.
    fn fixture(name: &str) -> OnnxGoalModel {
        let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
        let session = load_session(path, 1).expect("Failed to load fixture");
        let columns = vec![
            FeatureColumn::numeric("Shots"),
            FeatureColumn::numeric("Shots_p90"),
        ];
        OnnxGoalModel::new(session, columns, None).unwrap()
    }

    #[test]
    fn test_input_name_defaults_to_first_session_input() {
        assert_eq!(fixture("linear_f32.onnx").input_name(), "float_input");
    }

    #[test]
    fn test_predict_single_precision_output() {
        let model = fixture("linear_f32.onnx");
        let predictions = model.predict(&[forward(), forward()]).unwrap();
        assert_eq!(predictions, vec![41.0, 41.0]);
    }

    #[test]
    fn test_predict_double_precision_output() {
        let model = fixture("linear_f64.onnx");
        let predictions = model.predict(&[forward()]).unwrap();
        assert_eq!(predictions, vec![41.0]);
    }

    #[test]
    fn test_row_count_mismatch() {
        let model = fixture("sum_all_f32.onnx");
        let err = model.predict(&[forward(), forward()]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::RowCountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_service_over_onnx_model() {
        let service = crate::service::PredictionService::new(std::sync::Arc::new(fixture(
            "linear_f32.onnx",
        )));
        let result = service.predict(forward().raw().clone());
        assert_eq!(
            result,
            crate::server::types::PredictionResult::Success {
                predicted_goals: 41.0
            }
        );
    }
}

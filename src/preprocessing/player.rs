//! Feature derivation for per-player statistics.
//!
//! The exported model pipeline expects three engineered columns next to the
//! raw ones. It imputes and scales on its own but does not compute these, so
//! the arithmetic here must match the training notebook exactly.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::measure::Measure;
use crate::error::SchemaError;

pub const APPEARANCES: &str = "Appearances";
pub const SHOTS: &str = "Shots";
pub const SHOTS_ON_TARGET: &str = "Shots on target";
pub const SHOOTING_ACCURACY: &str = "Shooting accuracy %";

pub const NINETY_S: &str = "90s";
pub const SHOTS_P90: &str = "Shots_p90";
pub const GOALS_MISSED_PCT: &str = "Goals_missed_%";

/// Caller-supplied statistics, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPlayerRecord(Map<String, Value>);

impl RawPlayerRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Reads a required statistic: a number, or `null` for missing.
    fn measure(&self, field: &str) -> Result<Measure, SchemaError> {
        match self.0.get(field) {
            None => Err(SchemaError::MissingField(field.to_string())),
            Some(Value::Null) => Ok(Measure::MISSING),
            Some(Value::Number(n)) => Ok(Measure::from(n.as_f64())),
            Some(other) => Err(SchemaError::NotNumeric {
                field: field.to_string(),
                found: json_type(other),
            }),
        }
    }
}

impl From<Map<String, Value>> for RawPlayerRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for RawPlayerRecord {
    type Error = &'static str;

    /// Only a JSON object is a record; returns the offending type otherwise.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(json_type(&other)),
        }
    }
}

/// A raw record plus the engineered features.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPlayerRecord {
    raw: RawPlayerRecord,
    pub ninety_s: Measure,
    pub shots_p90: Measure,
    pub goals_missed_pct: Measure,
}

impl EnrichedPlayerRecord {
    pub fn raw(&self) -> &RawPlayerRecord {
        &self.raw
    }

    /// Looks up one of the three engineered columns by name.
    pub fn derived(&self, column: &str) -> Option<Measure> {
        match column {
            NINETY_S => Some(self.ninety_s),
            SHOTS_P90 => Some(self.shots_p90),
            GOALS_MISSED_PCT => Some(self.goals_missed_pct),
            _ => None,
        }
    }

    /// The full row the model sees: raw columns, with the engineered ones
    /// written over any raw column of the same name.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = self.raw.fields().clone();
        for (name, measure) in [
            (NINETY_S, self.ninety_s),
            (SHOTS_P90, self.shots_p90),
            (GOALS_MISSED_PCT, self.goals_missed_pct),
        ] {
            let value = measure.value().map_or(Value::Null, Value::from);
            row.insert(name.to_string(), value);
        }
        row
    }
}

impl Serialize for EnrichedPlayerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_row().serialize(serializer)
    }
}

/// Derives `90s`, `Shots_p90` and `Goals_missed_%` from a raw record.
///
/// Fails only when one of the four required statistics is absent or is
/// neither a number nor `null`.
pub fn derive(raw: RawPlayerRecord) -> Result<EnrichedPlayerRecord, SchemaError> {
    let appearances = raw.measure(APPEARANCES)?;
    let shots = raw.measure(SHOTS)?;
    let shots_on_target = raw.measure(SHOTS_ON_TARGET)?;
    let accuracy = raw.measure(SHOOTING_ACCURACY)?;

    let ninety_s = appearances * 90.0;

    // Guarded on 90s but divided by appearances, as in training.
    let shots_p90 = if ninety_s.is_positive() {
        shots / appearances
    } else {
        Measure::new(0.0)
    };

    // Shots is deliberately not checked; a missing value propagates.
    let goals_missed_pct =
        if shots_on_target.is_missing() || accuracy.is_missing() || shots_on_target.is_zero() {
            Measure::MISSING
        } else {
            ((shots * accuracy) / shots_on_target) * 100.0
        };

    Ok(EnrichedPlayerRecord {
        raw,
        ninety_s,
        shots_p90,
        goals_missed_pct,
    })
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

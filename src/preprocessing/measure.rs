//! An explicitly optional statistic.
//!
//! Player statistics arrive as JSON numbers or `null`. A `Measure` keeps the
//! "missing" case out of band instead of relying on NaN, and every arithmetic
//! operator propagates it: any operation with a missing operand is missing,
//! and an operation whose float result is NaN (`0 / 0`, `inf * 0`) becomes
//! missing too.

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Div, Mul};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measure(Option<f64>);

impl Measure {
    pub const MISSING: Measure = Measure(None);

    /// Wraps a float, mapping NaN to missing.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::MISSING
        } else {
            Measure(Some(value))
        }
    }

    pub fn value(self) -> Option<f64> {
        self.0
    }

    pub fn is_missing(self) -> bool {
        self.0.is_none()
    }

    /// `false` when missing, like a NaN comparison.
    pub fn is_positive(self) -> bool {
        matches!(self.0, Some(v) if v > 0.0)
    }

    /// `false` when missing. `-0.0` counts as zero.
    pub fn is_zero(self) -> bool {
        matches!(self.0, Some(v) if v == 0.0)
    }

    /// Lowers to the tensor representation, where missing is NaN.
    pub fn to_f32(self) -> f32 {
        self.0.map_or(f32::NAN, |v| v as f32)
    }
}

impl From<f64> for Measure {
    fn from(value: f64) -> Self {
        Measure::new(value)
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Measure::MISSING, Measure::new)
    }
}

impl Mul for Measure {
    type Output = Measure;

    fn mul(self, rhs: Measure) -> Measure {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Measure::new(a * b),
            _ => Measure::MISSING,
        }
    }
}

impl Mul<f64> for Measure {
    type Output = Measure;

    fn mul(self, rhs: f64) -> Measure {
        self * Measure::new(rhs)
    }
}

impl Div for Measure {
    type Output = Measure;

    fn div(self, rhs: Measure) -> Measure {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Measure::new(a / b),
            _ => Measure::MISSING,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "NaN"),
        }
    }
}

// Missing serializes as `null`, matching how it arrives.
impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_missing() {
        assert!(Measure::new(f64::NAN).is_missing());
        assert!(Measure::from(None).is_missing());
        assert_eq!(Measure::from(Some(2.5)).value(), Some(2.5));
    }

    #[test]
    fn test_missing_propagates_through_arithmetic() {
        let present = Measure::new(4.0);
        assert!((present * Measure::MISSING).is_missing());
        assert!((Measure::MISSING * present).is_missing());
        assert!((present / Measure::MISSING).is_missing());
        assert!((Measure::MISSING / present).is_missing());
        assert!((Measure::MISSING * 90.0).is_missing());
    }

    #[test]
    fn test_nan_results_become_missing() {
        let zero = Measure::new(0.0);
        assert!((zero / zero).is_missing());
        assert!((Measure::new(f64::INFINITY) * zero).is_missing());
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        let result = Measure::new(1.0) / Measure::new(0.0);
        assert_eq!(result.value(), Some(f64::INFINITY));
    }

    #[test]
    fn test_comparisons_treat_missing_as_false() {
        assert!(!Measure::MISSING.is_positive());
        assert!(!Measure::MISSING.is_zero());
        assert!(Measure::new(-0.0).is_zero());
        assert!(!Measure::new(0.0).is_positive());
        assert!(Measure::new(0.5).is_positive());
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&Measure::MISSING).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Measure::new(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_to_f32() {
        assert!(Measure::MISSING.to_f32().is_nan());
        assert_eq!(Measure::new(2.0).to_f32(), 2.0f32);
    }
}

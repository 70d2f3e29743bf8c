//! Property values as stored by the external property model.
//!
//! A curve never lives on its own: it is attached to a `ValueSpread`, and
//! only spreads flagged as animated are exposed to the curve editor.

use crate::curve::Curve;
use serde::{Deserialize, Serialize};

/// A scalar with a random spread and an optional animation curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSpread {
    pub value: f64,
    pub spread: f64,
    /// When set, `curve` drives the value over the normalized lifetime.
    pub animated: bool,
    pub curve: Curve,
}

impl ValueSpread {
    /// A static value with a flat curve at `value`.
    pub fn new(value: f64, spread: f64) -> Self {
        Self {
            value,
            spread,
            animated: false,
            curve: Curve::constant(value),
        }
    }

    /// An animated value driven by `curve`.
    pub fn animated(value: f64, spread: f64, curve: Curve) -> Self {
        Self {
            value,
            spread,
            animated: true,
            curve,
        }
    }

    /// Copy of this spread carrying a different curve.
    pub fn with_curve(&self, curve: Curve) -> Self {
        Self {
            curve,
            ..self.clone()
        }
    }
}

/// A value held by the property model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Scalar { value: f64 },
    Spread(ValueSpread),
}

impl PropertyValue {
    /// The attached curve when this is an animated spread.
    pub fn animated_curve(&self) -> Option<&Curve> {
        match self {
            PropertyValue::Spread(vs) if vs.animated => Some(&vs.curve),
            _ => None,
        }
    }

    pub fn as_spread(&self) -> Option<&ValueSpread> {
        match self {
            PropertyValue::Spread(vs) => Some(vs),
            PropertyValue::Scalar { .. } => None,
        }
    }
}

impl From<ValueSpread> for PropertyValue {
    fn from(vs: ValueSpread) -> Self {
        PropertyValue::Spread(vs)
    }
}

//! Typed strategy parameters.
//!
//! Grid legs and config files carry parameter overrides as a
//! `ParamMap`. Each strategy interprets the keys it knows and rejects the
//! rest, so a typo in a config file fails loudly instead of being ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single parameter value. Untagged so TOML/JSON scalars map directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Weights(BTreeMap<String, f64>),
}

pub type ParamMap = BTreeMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter '{key}' for strategy '{strategy}'")]
    Unknown { strategy: String, key: String },

    #[error("parameter '{key}' expects {expected}, got {got}")]
    WrongType {
        key: String,
        expected: &'static str,
        got: String,
    },

    #[error("parameter '{key}' out of range: {reason}")]
    OutOfRange { key: String, reason: String },
}

impl ParamError {
    pub fn unknown(strategy: &str, key: &str) -> Self {
        Self::Unknown {
            strategy: strategy.to_string(),
            key: key.to_string(),
        }
    }

    pub fn out_of_range(key: &str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl ParamValue {
    fn wrong_type(&self, key: &str, expected: &'static str) -> ParamError {
        ParamError::WrongType {
            key: key.to_string(),
            expected,
            got: self.to_string(),
        }
    }

    /// Numeric value; integers widen to floats.
    pub fn as_f64(&self, key: &str) -> Result<f64, ParamError> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(other.wrong_type(key, "a number")),
        }
    }

    pub fn as_usize(&self, key: &str) -> Result<usize, ParamError> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as usize),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Ok(*v as usize),
            other => Err(other.wrong_type(key, "a non-negative integer")),
        }
    }

    pub fn as_bool(&self, key: &str) -> Result<bool, ParamError> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(other.wrong_type(key, "a boolean")),
        }
    }

    pub fn as_text(&self, key: &str) -> Result<&str, ParamError> {
        match self {
            ParamValue::Text(v) => Ok(v),
            other => Err(other.wrong_type(key, "a string")),
        }
    }

    pub fn as_weights(&self, key: &str) -> Result<&BTreeMap<String, f64>, ParamError> {
        match self {
            ParamValue::Weights(v) => Ok(v),
            other => Err(other.wrong_type(key, "a symbol → weight table")),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "\"{v}\""),
            ParamValue::Weights(w) => {
                let parts: Vec<String> = w.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<BTreeMap<String, f64>> for ParamValue {
    fn from(v: BTreeMap<String, f64>) -> Self {
        ParamValue::Weights(v)
    }
}

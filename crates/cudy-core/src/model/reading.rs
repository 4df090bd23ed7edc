// ── Sensor values ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single sensor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Reading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", if *v { "on" } else { "off" }),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.2}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Reading {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Reading {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Reading {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for Reading {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<u8> for Reading {
    fn from(v: u8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Reading {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Reading {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Reading {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_friendly() {
        assert_eq!(Reading::from(true).to_string(), "on");
        assert_eq!(Reading::from(12.3456).to_string(), "12.35");
        assert_eq!(Reading::from(u64::MAX), Reading::Int(i64::MAX));
        assert_eq!(Reading::from("LTE").as_text(), Some("LTE"));
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![Reading::Int(3), Reading::from("x")])
            .expect("serialize");
        assert_eq!(json, r#"[3,"x"]"#);
    }
}

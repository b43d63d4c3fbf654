use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dynamically-typed value flowing through the simulator.
///
/// Used for: configured `const`/`set` values, generated argument values
/// passed down to the database layer, and decoded result-set cells.
/// Replaces the driver's own scanned-cell representation so the rest of
/// the crate never has to know about a specific driver's handle types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    #[serde(with = "humantime_serde")]
    Interval(Duration),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Interval(d) => write!(f, "{}", humantime::format_duration(*d)),
        }
    }
}

/// A single result-set row: an order-preserving mapping of column name to
/// cell value. Order-preserving so that dependency checks against
/// "row[0] contains column C" don't depend on a `HashMap`'s unspecified
/// iteration order.
pub type Row = indexmap::IndexMap<String, Value>;

//! Argument specifications: a typed recipe that produces a value and
//! reports whether it is currently satisfiable, given a VU.
//!
//! Expressed as an enum, one variant per kind, but deserialized by hand
//! rather than through serde's tagged-enum derive: a missing or
//! wrong-typed field needs to surface as a `DrkError::FieldMissing` /
//! `FieldTypeMismatch`, and an unrecognized `type` tag as
//! `DrkError::UnknownArgKind`, not as an opaque serde message.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::time::Duration;

use crate::error::DrkError;
use crate::generators::GeneratorCatalogue;
use crate::sampler;
use crate::value::Value;
use crate::vu::Vu;
use crate::weighted::{build_weighted_items, WeightedItems};

#[derive(Clone, Debug)]
pub enum Argument {
    Gen {
        value: String,
    },
    Ref {
        query: String,
        column: String,
    },
    Set {
        values: Vec<Value>,
        weights: Option<Vec<i64>>,
    },
    Const {
        value: Value,
    },
    Int {
        min: i64,
        max: i64,
    },
    Float {
        min: f64,
        max: f64,
    },
    Timestamp {
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    },
    Interval {
        min: Duration,
        max: Duration,
    },
}

type YamlValue = serde_yaml::Value;

fn field<'a>(raw: &'a YamlValue, name: &str) -> Result<&'a YamlValue, DrkError> {
    raw.as_mapping()
        .and_then(|m| m.iter().find_map(|(k, v)| (k.as_str() == Some(name)).then_some(v)))
        .ok_or_else(|| DrkError::FieldMissing { field: name.to_string() })
}

fn optional_field<'a>(raw: &'a YamlValue, name: &str) -> Option<&'a YamlValue> {
    raw.as_mapping()
        .and_then(|m| m.iter().find_map(|(k, v)| (k.as_str() == Some(name)).then_some(v)))
}

fn field_string(raw: &YamlValue, name: &str) -> Result<String, DrkError> {
    field(raw, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DrkError::FieldTypeMismatch {
            field: name.to_string(),
            kind: "string".to_string(),
        })
}

fn field_i64(raw: &YamlValue, name: &str) -> Result<i64, DrkError> {
    field(raw, name)?.as_i64().ok_or_else(|| DrkError::FieldTypeMismatch {
        field: name.to_string(),
        kind: "int".to_string(),
    })
}

fn field_f64(raw: &YamlValue, name: &str) -> Result<f64, DrkError> {
    field(raw, name)?.as_f64().ok_or_else(|| DrkError::FieldTypeMismatch {
        field: name.to_string(),
        kind: "float".to_string(),
    })
}

fn field_timestamp(raw: &YamlValue, name: &str) -> Result<DateTime<Utc>, DrkError> {
    let s = field_string(raw, name)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DrkError::FieldParse {
            field: name.to_string(),
            source: anyhow::anyhow!(e),
        })
}

fn field_duration(raw: &YamlValue, name: &str) -> Result<Duration, DrkError> {
    let s = field_string(raw, name)?;
    humantime::parse_duration(&s).map_err(|e| DrkError::FieldParse {
        field: name.to_string(),
        source: anyhow::anyhow!(e),
    })
}

fn field_value(raw: &YamlValue, name: &str) -> Result<Value, DrkError> {
    let v = field(raw, name)?.clone();
    serde_yaml::from_value(v).map_err(|e| DrkError::FieldParse {
        field: name.to_string(),
        source: anyhow::anyhow!(e),
    })
}

fn field_values(raw: &YamlValue, name: &str) -> Result<Vec<Value>, DrkError> {
    let v = field(raw, name)?;
    let seq = v.as_sequence().ok_or_else(|| DrkError::FieldTypeMismatch {
        field: name.to_string(),
        kind: "list".to_string(),
    })?;
    seq.iter()
        .map(|item| {
            serde_yaml::from_value(item.clone()).map_err(|e| DrkError::FieldParse {
                field: name.to_string(),
                source: anyhow::anyhow!(e),
            })
        })
        .collect()
}

fn field_weights(raw: &YamlValue, name: &str) -> Result<Option<Vec<i64>>, DrkError> {
    let Some(v) = optional_field(raw, name) else {
        return Ok(None);
    };
    let seq = v.as_sequence().ok_or_else(|| DrkError::FieldTypeMismatch {
        field: name.to_string(),
        kind: "list".to_string(),
    })?;
    seq.iter()
        .map(|item| {
            item.as_i64().ok_or_else(|| DrkError::FieldTypeMismatch {
                field: name.to_string(),
                kind: "int".to_string(),
            })
        })
        .collect::<Result<Vec<i64>, DrkError>>()
        .map(Some)
}

impl Argument {
    /// The entry point tests exercise directly to inspect the exact
    /// `DrkError` a malformed argument produces, rather than the
    /// serde-wrapped string `Deserialize` surfaces to callers going
    /// through a full YAML document.
    fn from_yaml_value(raw: &YamlValue) -> Result<Self, DrkError> {
        let kind = field_string(raw, "type")?;

        Ok(match kind.as_str() {
            "gen" => Argument::Gen {
                value: field_string(raw, "value")?,
            },
            "ref" => Argument::Ref {
                query: field_string(raw, "query")?,
                column: field_string(raw, "column")?,
            },
            "set" => Argument::Set {
                values: field_values(raw, "values")?,
                weights: field_weights(raw, "weights")?,
            },
            "const" => Argument::Const {
                value: field_value(raw, "value")?,
            },
            "int" => Argument::Int {
                min: field_i64(raw, "min")?,
                max: field_i64(raw, "max")?,
            },
            "float" => Argument::Float {
                min: field_f64(raw, "min")?,
                max: field_f64(raw, "max")?,
            },
            "timestamp" => Argument::Timestamp {
                min: field_timestamp(raw, "min")?,
                max: field_timestamp(raw, "max")?,
            },
            "interval" | "duration" => Argument::Interval {
                min: field_duration(raw, "min")?,
                max: field_duration(raw, "max")?,
            },
            other => return Err(DrkError::UnknownArgKind { kind: other.to_string() }),
        })
    }
}

impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = YamlValue::deserialize(deserializer)?;
        Argument::from_yaml_value(&raw).map_err(de::Error::custom)
    }
}

impl Argument {
    /// Materialises a concrete value to pass as a statement parameter.
    pub fn generate(&self, vu: &Vu, catalogue: &GeneratorCatalogue) -> Result<Value, DrkError> {
        match self {
            Argument::Gen { value } => {
                let generator = catalogue
                    .get(value)
                    .ok_or_else(|| DrkError::UnknownGenerator { name: value.clone() })?;
                Ok(generator())
            }

            Argument::Ref { query, column } => {
                let rows = vu
                    .data_for(query)
                    .ok_or_else(|| DrkError::MissingQueryData { query: query.clone() })?;
                if rows.is_empty() {
                    return Err(DrkError::MissingQueryData { query: query.clone() });
                }
                let row_idx = sampler::int(0, rows.len() as i64) as usize;
                rows[row_idx]
                    .get(column)
                    .cloned()
                    .ok_or_else(|| DrkError::MissingColumn {
                        query: query.clone(),
                        column: column.clone(),
                    })
            }

            Argument::Set { values, weights } => {
                let items: WeightedItems =
                    build_weighted_items(values.clone(), weights.clone())?;
                Ok(items.choose())
            }

            Argument::Const { value } => Ok(value.clone()),

            Argument::Int { min, max } => Ok(Value::Int(sampler::int(*min, *max))),

            Argument::Float { min, max } => Ok(Value::Float(sampler::float(*min, *max))),

            Argument::Timestamp { min, max } => Ok(Value::Timestamp(sampler::timestamp(*min, *max))),

            Argument::Interval { min, max } => Ok(Value::Interval(sampler::interval(*min, *max))),
        }
    }

    /// Non-blocking, side-effect-free predicate: true iff `generate` can
    /// succeed right now.
    pub fn dependency_met(&self, vu: &Vu) -> bool {
        match self {
            Argument::Ref { query, column } => vu
                .data_for(query)
                .is_some_and(|rows| rows.first().is_some_and(|row| row.contains_key(column))),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Row;

    fn catalogue() -> GeneratorCatalogue {
        GeneratorCatalogue::builtin()
    }

    #[test]
    fn const_returns_value_verbatim() {
        let vu = Vu::new();
        let arg = Argument::Const { value: Value::Int(7) };
        assert_eq!(arg.generate(&vu, &catalogue()).unwrap(), Value::Int(7));
    }

    #[test]
    fn gen_unknown_generator_errors() {
        let vu = Vu::new();
        let arg = Argument::Gen { value: "nope".to_string() };
        assert!(matches!(
            arg.generate(&vu, &catalogue()),
            Err(DrkError::UnknownGenerator { .. })
        ));
    }

    #[test]
    fn int_scalar_always_satisfiable() {
        let vu = Vu::new();
        let arg = Argument::Int { min: 1, max: 1 };
        assert!(arg.dependency_met(&vu));
        assert_eq!(arg.generate(&vu, &catalogue()).unwrap(), Value::Int(1));
    }

    #[test]
    fn ref_against_absent_key_is_unmet_and_errors() {
        let vu = Vu::new();
        let arg = Argument::Ref {
            query: "seed".to_string(),
            column: "id".to_string(),
        };
        assert!(!arg.dependency_met(&vu));
        assert!(matches!(
            arg.generate(&vu, &catalogue()),
            Err(DrkError::MissingQueryData { .. })
        ));
    }

    #[test]
    fn ref_against_empty_result_set_is_unmet_and_errors() {
        let vu = Vu::new();
        vu.apply_data("seed", Vec::new());
        let arg = Argument::Ref {
            query: "seed".to_string(),
            column: "id".to_string(),
        };
        assert!(!arg.dependency_met(&vu));
        assert!(matches!(
            arg.generate(&vu, &catalogue()),
            Err(DrkError::MissingQueryData { .. })
        ));
    }

    #[test]
    fn ref_against_present_column_is_met() {
        let vu = Vu::new();
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Text("a".to_string()));
        vu.apply_data("seed", vec![row]);

        let arg = Argument::Ref {
            query: "seed".to_string(),
            column: "id".to_string(),
        };
        assert!(arg.dependency_met(&vu));
        assert_eq!(
            arg.generate(&vu, &catalogue()).unwrap(),
            Value::Text("a".to_string())
        );
    }

    #[test]
    fn ref_against_missing_column_is_unmet_and_errors() {
        let vu = Vu::new();
        let mut row = Row::new();
        row.insert("other".to_string(), Value::Text("a".to_string()));
        vu.apply_data("seed", vec![row]);

        let arg = Argument::Ref {
            query: "seed".to_string(),
            column: "id".to_string(),
        };
        assert!(!arg.dependency_met(&vu));
        assert!(matches!(
            arg.generate(&vu, &catalogue()),
            Err(DrkError::MissingColumn { .. })
        ));
    }

    #[test]
    fn set_missing_values_is_a_parse_error() {
        let yaml = "type: set\nweights: [1, 2]\n";
        let result: Result<Argument, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());

        let raw: YamlValue = serde_yaml::from_str(yaml).unwrap();
        let err = Argument::from_yaml_value(&raw).unwrap_err();
        assert!(matches!(err, DrkError::FieldMissing { field } if field == "values"));
    }

    #[test]
    fn wrong_type_field_is_a_type_mismatch() {
        let yaml = "type: int\nmin: not-a-number\nmax: 5\n";
        let raw: YamlValue = serde_yaml::from_str(yaml).unwrap();
        let err = Argument::from_yaml_value(&raw).unwrap_err();
        assert!(matches!(err, DrkError::FieldTypeMismatch { field, kind } if field == "min" && kind == "int"));
    }

    #[test]
    fn unknown_type_tag_is_unknown_arg_kind() {
        let yaml = "type: regex\nvalue: \"[a-z]+\"\n";
        let raw: YamlValue = serde_yaml::from_str(yaml).unwrap();
        let err = Argument::from_yaml_value(&raw).unwrap_err();
        assert!(matches!(err, DrkError::UnknownArgKind { kind } if kind == "regex"));
    }

    #[test]
    fn missing_type_tag_is_field_missing() {
        let yaml = "value: \"x\"\n";
        let raw: YamlValue = serde_yaml::from_str(yaml).unwrap();
        let err = Argument::from_yaml_value(&raw).unwrap_err();
        assert!(matches!(err, DrkError::FieldMissing { field } if field == "type"));
    }

    #[test]
    fn weighted_set_picks_only_positive_weight() {
        let vu = Vu::new();
        let arg = Argument::Set {
            values: vec![Value::Text("x".to_string()), Value::Text("y".to_string())],
            weights: Some(vec![1, 0]),
        };
        for _ in 0..1000 {
            assert_eq!(
                arg.generate(&vu, &catalogue()).unwrap(),
                Value::Text("x".to_string())
            );
        }
    }
}

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;

/// namespace -> model name -> field values
pub type ModelMap = BTreeMap<String, BTreeMap<String, Fields>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{model} is missing required field `{field}`")]
    MissingField {
        model: &'static str,
        field: &'static str,
    },
    #[error("{model} field `{field}` is malformed: {reason}")]
    InvalidField {
        model: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Raw record returned by the indexing service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    /// Stable hashed key, identical across fetch results and subscription pushes.
    #[serde(rename = "entityId", alias = "hashed_keys", alias = "entity_id")]
    pub entity_id: String,
    #[serde(default)]
    pub models: ModelMap,
}

impl Entity {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            models: ModelMap::new(),
        }
    }

    pub fn with_model(mut self, namespace: &str, model: &str, fields: Fields) -> Self {
        self.models
            .entry(namespace.to_string())
            .or_default()
            .insert(model.to_string(), fields);
        self
    }

    pub fn model(&self, namespace: &str, model: &str) -> Option<&Fields> {
        self.models.get(namespace)?.get(model)
    }

    /// The service echoes a zero-keyed entity when a subscription is registered; it carries no data.
    pub fn is_sentinel(&self) -> bool {
        is_zero_felt(&self.entity_id)
    }
}

/// Empty, `0`, `0x` and any run of zeros all count as the zero felt.
pub fn is_zero_felt(value: &str) -> bool {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    digits.chars().all(|c| c == '0')
}

/// Canonical 66-character form of a hex address (`0x` + 64 lowercase digits). Strings that are
/// not hex addresses are returned unchanged.
pub fn pad_address(address: &str) -> String {
    let trimmed = address.trim();
    let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    else {
        return trimmed.to_string();
    };
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return trimmed.to_string();
    }
    let significant = digits.trim_start_matches('0').to_ascii_lowercase();
    format!("0x{significant:0>64}")
}

/// Typed access to one model's fields. Absent optional fields fall back to their defaults,
/// present-but-garbled ones are reported.
pub(crate) struct FieldReader<'a> {
    model: &'static str,
    fields: &'a Fields,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(model: &'static str, fields: &'a Fields) -> Self {
        Self { model, fields }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> ParseError {
        ParseError::InvalidField {
            model: self.model,
            field,
            reason: reason.into(),
        }
    }

    fn missing(&self, field: &'static str) -> ParseError {
        ParseError::MissingField {
            model: self.model,
            field,
        }
    }

    pub(crate) fn string(&self, field: &'static str) -> String {
        match self.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    pub(crate) fn required_string(&self, field: &'static str) -> Result<String, ParseError> {
        if self.get(field).is_none() {
            return Err(self.missing(field));
        }
        Ok(self.string(field))
    }

    pub(crate) fn u64(&self, field: &'static str) -> Result<u64, ParseError> {
        match self.get(field) {
            None => Ok(0),
            Some(value) => parse_u64(value).map_err(|reason| self.invalid(field, reason)),
        }
    }

    pub(crate) fn required_u64(&self, field: &'static str) -> Result<u64, ParseError> {
        match self.get(field) {
            None => Err(self.missing(field)),
            Some(value) => parse_u64(value).map_err(|reason| self.invalid(field, reason)),
        }
    }

    pub(crate) fn f64(&self, field: &'static str) -> Result<f64, ParseError> {
        match self.get(field) {
            None => Ok(0.0),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| self.invalid(field, "not representable as f64")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| self.invalid(field, e.to_string())),
            Some(other) => Err(self.invalid(field, format!("unexpected value {other}"))),
        }
    }

    pub(crate) fn bool(&self, field: &'static str) -> Result<bool, ParseError> {
        match self.get(field) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => parse_u64(value)
                .map(|n| n != 0)
                .map_err(|reason| self.invalid(field, reason)),
        }
    }

    /// Nested data arrives either as a JSON object or as JSON text stored in a ByteArray.
    pub(crate) fn json<T: DeserializeOwned + Default>(
        &self,
        field: &'static str,
    ) -> Result<T, ParseError> {
        match self.get(field) {
            None => Ok(T::default()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(T::default()),
            Some(Value::String(s)) => {
                serde_json::from_str(s).map_err(|e| self.invalid(field, e.to_string()))
            }
            Some(value) => {
                T::deserialize(value).map_err(|e| self.invalid(field, e.to_string()))
            }
        }
    }
}

fn parse_u64(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| format!("{n} is not an unsigned integer")),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Some(hex) = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
            {
                if hex.is_empty() {
                    return Ok(0);
                }
                u64::from_str_radix(hex, 16).map_err(|e| format!("{trimmed}: {e}"))
            } else {
                trimmed.parse::<u64>().map_err(|e| format!("{trimmed}: {e}"))
            }
        }
        other => Err(format!("unexpected value {other}")),
    }
}

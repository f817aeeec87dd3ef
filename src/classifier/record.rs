//! Feature Record - one subject's inputs, keyed by feature name

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A single scalar input value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FeatureValue {
    /// Short type name used in client-facing messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureValue::Bool(_) => "boolean",
            FeatureValue::Number(_) => "number",
            FeatureValue::Text(_) => "string",
        }
    }

    /// Canonical text form, used to match categories
    pub fn to_text(&self) -> String {
        match self {
            FeatureValue::Bool(b) => b.to_string(),
            FeatureValue::Number(n) => n.to_string(),
            FeatureValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("request body must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("feature `{key}` must be a string, number or boolean, got {found}")]
    NonScalar { key: String, found: &'static str },
}

/// One row of named inputs. Keys are not checked here; the classifier decides
/// which of them it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureRecord(BTreeMap<String, FeatureValue>);

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TryFrom<Value> for FeatureRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(RecordError::NotAnObject(json_type_name(&other))),
        };

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            let feature = match value {
                Value::Bool(b) => FeatureValue::Bool(b),
                Value::String(s) => FeatureValue::Text(s),
                Value::Number(ref n) => match n.as_f64() {
                    Some(n) => FeatureValue::Number(n),
                    None => {
                        return Err(RecordError::NonScalar { key, found: "number" });
                    }
                },
                other => {
                    return Err(RecordError::NonScalar {
                        key,
                        found: json_type_name(&other),
                    });
                }
            };
            fields.insert(key, feature);
        }

        Ok(Self(fields))
    }
}

//! Feature Schema - turns a Feature Record into the estimator's input vector
//!
//! Column encoding mirrors the preprocessing step of the exported pipeline:
//! numeric columns are standardised, categorical columns are one-hot encoded,
//! boolean columns become 0/1.

use std::collections::HashSet;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::record::{FeatureRecord, FeatureValue};
use super::{ArtifactError, ClassifierError};

/// What to do with a category the encoder never saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

fn unit_scale() -> f64 {
    1.0
}

/// One input column as described by the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSpec {
    Numeric {
        name: String,
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    Categorical {
        name: String,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Boolean {
        name: String,
    },
}

impl FeatureSpec {
    pub fn name(&self) -> &str {
        match self {
            FeatureSpec::Numeric { name, .. }
            | FeatureSpec::Categorical { name, .. }
            | FeatureSpec::Boolean { name } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureSpec::Numeric { .. } => "numeric",
            FeatureSpec::Categorical { .. } => "categorical",
            FeatureSpec::Boolean { .. } => "boolean",
        }
    }

    /// Number of encoded columns this feature occupies
    pub fn width(&self) -> usize {
        match self {
            FeatureSpec::Categorical { categories, .. } => categories.len(),
            _ => 1,
        }
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.name().is_empty() {
            return Err(ArtifactError::Invalid("feature with empty name".into()));
        }
        match self {
            FeatureSpec::Numeric { name, mean, scale } => {
                if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                    return Err(ArtifactError::Invalid(format!(
                        "numeric feature `{}` needs a finite mean and a finite non-zero scale",
                        name
                    )));
                }
            }
            FeatureSpec::Categorical { name, categories, .. } => {
                if categories.is_empty() {
                    return Err(ArtifactError::Invalid(format!(
                        "categorical feature `{}` has no categories",
                        name
                    )));
                }
                let mut seen = HashSet::new();
                for category in categories {
                    if !seen.insert(category.as_str()) {
                        return Err(ArtifactError::Invalid(format!(
                            "categorical feature `{}` lists `{}` twice",
                            name, category
                        )));
                    }
                }
            }
            FeatureSpec::Boolean { .. } => {}
        }
        Ok(())
    }

    fn encode_into(&self, value: &FeatureValue, out: &mut [f64]) -> Result<(), ClassifierError> {
        match self {
            FeatureSpec::Numeric { name, mean, scale } => {
                let x = numeric_value(name, value)?;
                out[0] = (x - mean) / scale;
            }
            FeatureSpec::Categorical { name, categories, handle_unknown } => {
                let text = value.to_text();
                match categories.iter().position(|c| category_matches(c, &text, value)) {
                    Some(i) => out[i] = 1.0,
                    None if *handle_unknown == HandleUnknown::Ignore => {}
                    None => {
                        return Err(ClassifierError::InvalidInput(format!(
                            "unknown category `{}` for feature `{}`",
                            text, name
                        )));
                    }
                }
            }
            FeatureSpec::Boolean { name } => {
                out[0] = if boolean_value(name, value)? { 1.0 } else { 0.0 };
            }
        }
        Ok(())
    }
}

/// Numbers also match categories spelled as an equal number (`3` matches `"3.0"`).
fn category_matches(category: &str, text: &str, value: &FeatureValue) -> bool {
    if category == text {
        return true;
    }
    match value {
        FeatureValue::Number(n) => category.trim().parse::<f64>().map_or(false, |c| c == *n),
        _ => false,
    }
}

fn numeric_value(name: &str, value: &FeatureValue) -> Result<f64, ClassifierError> {
    let parsed = match value {
        FeatureValue::Number(n) => Some(*n),
        FeatureValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        FeatureValue::Text(s) => s.trim().parse::<f64>().ok(),
    };
    parsed.filter(|x| x.is_finite()).ok_or_else(|| {
        ClassifierError::InvalidInput(format!(
            "feature `{}` must be numeric, got {} `{}`",
            name,
            value.type_name(),
            value.to_text()
        ))
    })
}

fn boolean_value(name: &str, value: &FeatureValue) -> Result<bool, ClassifierError> {
    let parsed = match value {
        FeatureValue::Bool(b) => Some(*b),
        FeatureValue::Number(n) if *n == 0.0 => Some(false),
        FeatureValue::Number(n) if *n == 1.0 => Some(true),
        FeatureValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| {
        ClassifierError::InvalidInput(format!(
            "feature `{}` must be boolean, got {} `{}`",
            name,
            value.type_name(),
            value.to_text()
        ))
    })
}

/// Ordered input columns of a loaded model
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    specs: Vec<FeatureSpec>,
    width: usize,
    strict: bool,
}

impl FeatureSchema {
    /// Build a schema; `strict` rejects records carrying keys the schema does not name.
    pub fn new(specs: Vec<FeatureSpec>, strict: bool) -> Result<Self, ArtifactError> {
        let mut names = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !names.insert(spec.name().to_string()) {
                return Err(ArtifactError::Invalid(format!(
                    "feature `{}` declared twice",
                    spec.name()
                )));
            }
        }
        let width = specs.iter().map(FeatureSpec::width).sum();
        Ok(Self { specs, width, strict })
    }

    /// Length of the encoded vector
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn encode(&self, record: &FeatureRecord) -> Result<Array1<f64>, ClassifierError> {
        if self.strict {
            let unknown: Vec<&str> = record
                .keys()
                .filter(|key| !self.specs.iter().any(|s| s.name() == *key))
                .collect();
            if !unknown.is_empty() {
                return Err(ClassifierError::InvalidInput(format!(
                    "unknown features: {}",
                    unknown.join(", ")
                )));
            }
        }

        let missing: Vec<&str> = self
            .specs
            .iter()
            .map(FeatureSpec::name)
            .filter(|name| record.get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ClassifierError::InvalidInput(format!(
                "missing required features: {}",
                missing.join(", ")
            )));
        }

        let mut encoded = vec![0.0; self.width];
        let mut offset = 0;
        for spec in &self.specs {
            let width = spec.width();
            if let Some(value) = record.get(spec.name()) {
                spec.encode_into(value, &mut encoded[offset..offset + width])?;
            }
            offset += width;
        }

        Ok(Array1::from_vec(encoded))
    }
}

//! Label probability mapping

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Allowed drift of the probability sum away from 1.0
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Probability per label, kept in the classifier's label order.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Probabilities(Vec<(String, f64)>);

impl Probabilities {
    /// Pair labels with probabilities positionally
    pub fn from_labels(labels: &[String], values: &[f64]) -> Self {
        Self(labels.iter().cloned().zip(values.iter().copied()).collect())
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().map(|(_, p)| p).sum()
    }

    pub fn max(&self) -> Option<f64> {
        self.0.iter().map(|(_, p)| *p).reduce(f64::max)
    }

    /// Most likely label; ties go to the earliest label.
    pub fn argmax(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (label, p) in self.iter() {
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((label, p)),
            }
        }
        best
    }

    /// Check that this is a proper distribution: finite entries in [0, 1]
    /// summing to 1 within [`SUM_TOLERANCE`].
    pub fn check_distribution(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("empty probability mapping".to_string());
        }
        for (label, p) in &self.0 {
            if !p.is_finite() || *p < 0.0 || *p > 1.0 + SUM_TOLERANCE {
                return Err(format!("probability for `{}` out of range: {}", label, p));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(format!("probabilities sum to {}", sum));
        }
        Ok(())
    }
}

impl Serialize for Probabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

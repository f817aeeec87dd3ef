//! Estimators - map an encoded feature vector to class probabilities

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{ArtifactError, ClassifierError};

/// Estimator section of the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorSpec {
    LogisticRegression {
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

impl EstimatorSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            EstimatorSpec::LogisticRegression { .. } => "logistic_regression",
            EstimatorSpec::DecisionTree { .. } => "decision_tree",
        }
    }
}

/// Flat tree node; the root is node 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

/// Compiled estimator, checked against the class count and encoded width
#[derive(Debug, Clone)]
pub enum Estimator {
    Linear(LinearModel),
    Tree(TreeModel),
}

impl Estimator {
    pub fn compile(
        spec: EstimatorSpec,
        n_classes: usize,
        width: usize,
    ) -> Result<Self, ArtifactError> {
        match spec {
            EstimatorSpec::LogisticRegression { coefficients, intercepts } => {
                LinearModel::new(coefficients, intercepts, n_classes, width).map(Estimator::Linear)
            }
            EstimatorSpec::DecisionTree { nodes } => {
                TreeModel::new(nodes, n_classes, width).map(Estimator::Tree)
            }
        }
    }

    /// Class probabilities, in artifact class order
    pub fn predict_proba(&self, x: &Array1<f64>) -> Result<Vec<f64>, ClassifierError> {
        match self {
            Estimator::Linear(model) => model.predict_proba(x),
            Estimator::Tree(model) => model.predict_proba(x),
        }
    }
}

// ============================================================================
// LOGISTIC REGRESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LinearModel {
    fn new(
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
        n_classes: usize,
        width: usize,
    ) -> Result<Self, ArtifactError> {
        let rows = coefficients.len();
        let binary = n_classes == 2 && rows == 1;
        if rows != n_classes && !binary {
            return Err(ArtifactError::Invalid(format!(
                "logistic_regression has {} coefficient rows for {} classes",
                rows, n_classes
            )));
        }
        if intercepts.len() != rows {
            return Err(ArtifactError::Invalid(format!(
                "logistic_regression has {} intercepts for {} coefficient rows",
                intercepts.len(),
                rows
            )));
        }
        if let Some(row) = coefficients.iter().find(|row| row.len() != width) {
            return Err(ArtifactError::Invalid(format!(
                "coefficient row of length {} does not match encoded width {}",
                row.len(),
                width
            )));
        }

        let flat: Vec<f64> = coefficients.into_iter().flatten().collect();
        if flat.iter().chain(intercepts.iter()).any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid(
                "logistic_regression contains non-finite weights".into(),
            ));
        }

        let weights = Array2::from_shape_vec((rows, width), flat)
            .map_err(|e| ArtifactError::Invalid(format!("coefficient shape error: {}", e)))?;

        Ok(Self {
            weights,
            intercepts: Array1::from_vec(intercepts),
        })
    }

    fn predict_proba(&self, x: &Array1<f64>) -> Result<Vec<f64>, ClassifierError> {
        if x.len() != self.weights.ncols() {
            return Err(ClassifierError::Internal(format!(
                "encoded vector has {} columns, model expects {}",
                x.len(),
                self.weights.ncols()
            )));
        }

        let scores = self.weights.dot(x) + &self.intercepts;

        if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            return Ok(vec![1.0 - p, p]);
        }
        Ok(softmax(&scores))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn softmax(scores: &Array1<f64>) -> Vec<f64> {
    let max = scores.fold(f64::NEG_INFINITY, |acc, &s| acc.max(s));
    let exps = scores.mapv(|s| (s - max).exp());
    let total = exps.sum();
    exps.iter().map(|e| e / total).collect()
}

// ============================================================================
// DECISION TREE
// ============================================================================

#[derive(Debug, Clone)]
pub struct TreeModel {
    nodes: Vec<TreeNode>,
}

impl TreeModel {
    fn new(nodes: Vec<TreeNode>, n_classes: usize, width: usize) -> Result<Self, ArtifactError> {
        if nodes.is_empty() {
            return Err(ArtifactError::Invalid("decision_tree has no nodes".into()));
        }

        for (i, node) in nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= width {
                        return Err(ArtifactError::Invalid(format!(
                            "node {} splits on column {} but encoded width is {}",
                            i, feature, width
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::Invalid(format!(
                            "node {} has a non-finite threshold",
                            i
                        )));
                    }
                    for child in [*left, *right] {
                        // Children must point forward, which also rules out cycles.
                        if child <= i || child >= nodes.len() {
                            return Err(ArtifactError::Invalid(format!(
                                "node {} has invalid child index {}",
                                i, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(ArtifactError::Invalid(format!(
                            "leaf {} has {} weights for {} classes",
                            i,
                            distribution.len(),
                            n_classes
                        )));
                    }
                    if distribution.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(ArtifactError::Invalid(format!(
                            "leaf {} has negative or non-finite weights",
                            i
                        )));
                    }
                    if distribution.iter().sum::<f64>() <= 0.0 {
                        return Err(ArtifactError::Invalid(format!("leaf {} is empty", i)));
                    }
                }
            }
        }

        Ok(Self { nodes })
    }

    fn predict_proba(&self, x: &Array1<f64>) -> Result<Vec<f64>, ClassifierError> {
        let mut index = 0;
        loop {
            let node = self.nodes.get(index).ok_or_else(|| {
                ClassifierError::Internal(format!("tree walked to missing node {}", index))
            })?;
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    let value = x.get(*feature).ok_or_else(|| {
                        ClassifierError::Internal(format!("split on missing column {}", feature))
                    })?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { distribution } => {
                    let total: f64 = distribution.iter().sum();
                    return Ok(distribution.iter().map(|w| w / total).collect());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_sums_to_one() {
        let model = Estimator::compile(
            EstimatorSpec::LogisticRegression {
                coefficients: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
                intercepts: vec![0.0, 0.5, 0.1],
            },
            3,
            2,
        )
        .unwrap();

        let probs = model.predict_proba(&array![2.0, -1.0]).unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[0] > probs[1] && probs[0] > probs[2]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_scores() {
        let model = Estimator::compile(
            EstimatorSpec::LogisticRegression {
                coefficients: vec![vec![1000.0], vec![-1000.0]],
                intercepts: vec![0.0, 0.0],
            },
            2,
            1,
        )
        .unwrap();

        let probs = model.predict_proba(&array![5.0]).unwrap();
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_binary_single_row() {
        let model = Estimator::compile(
            EstimatorSpec::LogisticRegression {
                coefficients: vec![vec![2.0]],
                intercepts: vec![0.0],
            },
            2,
            1,
        )
        .unwrap();

        let probs = model.predict_proba(&array![0.0]).unwrap();
        assert_eq!(probs, vec![0.5, 0.5]);

        let probs = model.predict_proba(&array![3.0]).unwrap();
        assert!(probs[1] > 0.99);
    }

    #[test]
    fn test_linear_shape_mismatch() {
        let wrong_rows = Estimator::compile(
            EstimatorSpec::LogisticRegression {
                coefficients: vec![vec![1.0]],
                intercepts: vec![0.0],
            },
            3,
            1,
        );
        assert!(wrong_rows.is_err());

        let wrong_width = Estimator::compile(
            EstimatorSpec::LogisticRegression {
                coefficients: vec![vec![1.0, 2.0], vec![1.0]],
                intercepts: vec![0.0, 0.0],
            },
            2,
            2,
        );
        assert!(wrong_width.is_err());
    }

    fn tree() -> Vec<TreeNode> {
        vec![
            TreeNode::Split { feature: 0, threshold: 0.5, left: 1, right: 2 },
            TreeNode::Leaf { distribution: vec![8.0, 2.0] },
            TreeNode::Leaf { distribution: vec![1.0, 3.0] },
        ]
    }

    #[test]
    fn test_tree_routing() {
        let model = Estimator::compile(EstimatorSpec::DecisionTree { nodes: tree() }, 2, 1).unwrap();

        assert_eq!(model.predict_proba(&array![0.5]).unwrap(), vec![0.8, 0.2]);
        assert_eq!(model.predict_proba(&array![0.9]).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_tree_validation() {
        let mut backwards = tree();
        backwards[0] = TreeNode::Split { feature: 0, threshold: 0.5, left: 0, right: 2 };
        assert!(Estimator::compile(EstimatorSpec::DecisionTree { nodes: backwards }, 2, 1).is_err());

        let mut bad_column = tree();
        bad_column[0] = TreeNode::Split { feature: 4, threshold: 0.5, left: 1, right: 2 };
        assert!(Estimator::compile(EstimatorSpec::DecisionTree { nodes: bad_column }, 2, 1).is_err());

        let mut empty_leaf = tree();
        empty_leaf[2] = TreeNode::Leaf { distribution: vec![0.0, 0.0] };
        assert!(Estimator::compile(EstimatorSpec::DecisionTree { nodes: empty_leaf }, 2, 1).is_err());

        assert!(Estimator::compile(EstimatorSpec::DecisionTree { nodes: tree() }, 3, 1).is_err());
    }

    #[test]
    fn test_estimator_section_deserializes() {
        let spec: EstimatorSpec = serde_json::from_str(
            r#"{"type": "decision_tree", "nodes": [
                {"feature": 0, "threshold": 1.0, "left": 1, "right": 2},
                {"distribution": [1, 0]},
                {"distribution": [0, 1]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(spec.kind(), "decision_tree");
    }
}

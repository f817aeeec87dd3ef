//! Shared test artifacts

/// Three-class logistic regression over two numeric inputs
pub(crate) const TREND_ARTIFACT: &str = r#"{
    "format_version": 1,
    "name": "mental_health_trend",
    "classes": ["stable", "declining", "improving"],
    "features": [
        {"name": "age", "kind": "numeric", "mean": 35.0, "scale": 10.0},
        {"name": "score", "kind": "numeric", "mean": 5.0, "scale": 2.0}
    ],
    "estimator": {
        "type": "logistic_regression",
        "coefficients": [[0.1, 0.2], [0.3, -0.8], [-0.2, 0.9]],
        "intercepts": [0.6, -0.2, -0.4]
    }
}"#;

/// Two-class tree over a categorical and a boolean input
pub(crate) const TREE_ARTIFACT: &str = r#"{
    "format_version": 1,
    "name": "sleep_trend_tree",
    "classes": ["declining", "improving"],
    "features": [
        {"name": "sleep_quality", "kind": "categorical",
         "categories": ["poor", "fair", "good"], "handle_unknown": "ignore"},
        {"name": "exercises", "kind": "boolean"}
    ],
    "estimator": {
        "type": "decision_tree",
        "nodes": [
            {"feature": 3, "threshold": 0.5, "left": 1, "right": 4},
            {"feature": 0, "threshold": 0.5, "left": 2, "right": 3},
            {"distribution": [3, 5]},
            {"distribution": [9, 1]},
            {"distribution": [1, 4]}
        ]
    }
}"#;

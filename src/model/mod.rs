//! Normalized model descriptors.
//!
//! A `ModelDescriptor` is a read-only snapshot of a trained model's numeric
//! parameters, independent of how the training toolkit stores them. It is
//! produced once by `extract` from a `ModelArtifact` and consumed by a code
//! generator.

mod artifact;
mod extract;

use std::fmt;

use serde::Serialize;

pub use artifact::{Coefficients, Intercept, ModelArtifact, NodeValues, TreeArrays};
pub use extract::{extract, MAX_FEATURES};

use crate::error::Result;

/// Feature index the training toolkit stores for leaf nodes.
pub const LEAF: i64 = -2;

// ─── Model Family ──────────────────────────────────────────────────

/// The closed set of model families with a generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ModelFamily {
    Linear,
    Logistic,
    Tree,
}

impl ModelFamily {
    /// Parse the training toolkit's class name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "LinearRegression" => Some(ModelFamily::Linear),
            "LogisticRegression" => Some(ModelFamily::Logistic),
            "DecisionTreeClassifier" => Some(ModelFamily::Tree),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ModelFamily::Linear => "LinearRegression",
            ModelFamily::Logistic => "LogisticRegression",
            ModelFamily::Tree => "DecisionTreeClassifier",
        }
    }

    /// Conventional name of the generated C file.
    pub fn output_file_name(self) -> &'static str {
        match self {
            ModelFamily::Linear => "linear_model.c",
            ModelFamily::Logistic => "logistic_model.c",
            ModelFamily::Tree => "tree_model.c",
        }
    }

    pub fn is_classifier(self) -> bool {
        !matches!(self, ModelFamily::Linear)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ─── Descriptor ────────────────────────────────────────────────────

/// One entry of a decision tree's node arena, indexed by position.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    /// Feature compared at this node; negative marks a leaf.
    pub feature_index: i64,
    pub threshold: f64,
    pub left_child: usize,
    pub right_child: usize,
    /// Per-class weight at this node. Only leaves use it.
    pub class_counts: Vec<f64>,
}

impl TreeNode {
    pub fn leaf(class_counts: Vec<f64>) -> Self {
        Self {
            feature_index: LEAF,
            threshold: 0.0,
            left_child: 0,
            right_child: 0,
            class_counts,
        }
    }

    pub fn split(feature: usize, threshold: f64, left_child: usize, right_child: usize) -> Self {
        Self {
            feature_index: feature as i64,
            threshold,
            left_child,
            right_child,
            class_counts: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_index < 0
    }

    /// Class predicted by a leaf: the first index holding the maximum count.
    pub fn predicted_class(&self) -> Option<usize> {
        argmax_first(&self.class_counts)
    }
}

/// Normalized parameters of a trained model.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelDescriptor {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Logistic {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Tree {
        nodes: Vec<TreeNode>,
    },
}

impl ModelDescriptor {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelDescriptor::Linear { .. } => ModelFamily::Linear,
            ModelDescriptor::Logistic { .. } => ModelFamily::Logistic,
            ModelDescriptor::Tree { .. } => ModelFamily::Tree,
        }
    }

    /// Number of input features the generated procedure reads.
    ///
    /// For trees this is one past the highest feature index used by a split,
    /// which may be less than the number of features seen in training.
    pub fn n_features(&self) -> usize {
        match self {
            ModelDescriptor::Linear { coefficients, .. }
            | ModelDescriptor::Logistic { coefficients, .. } => coefficients.len(),
            ModelDescriptor::Tree { nodes } => nodes
                .iter()
                .filter(|n| !n.is_leaf())
                .map(|n| n.feature_index as usize + 1)
                .max()
                .unwrap_or(0),
        }
    }

    /// One-paragraph human-readable summary.
    pub fn summary(&self) -> Result<String> {
        let mut out = format!("{}\n", self.family());
        match self {
            ModelDescriptor::Linear {
                intercept,
                coefficients,
            }
            | ModelDescriptor::Logistic {
                intercept,
                coefficients,
            } => {
                out.push_str(&format!("  Features: {}\n", coefficients.len()));
                out.push_str(&format!("  Intercept: {}\n", intercept));
                for (i, c) in coefficients.iter().enumerate() {
                    out.push_str(&format!("  x[{}] * {}\n", i, c));
                }
            }
            ModelDescriptor::Tree { nodes } => {
                let shape = crate::codegen::tree_shape(nodes)?;
                out.push_str(&format!("  Features used: {}\n", self.n_features()));
                out.push_str(&format!("  Nodes: {}\n", shape.nodes));
                out.push_str(&format!("  Leaves: {}\n", shape.leaves));
                out.push_str(&format!("  Depth: {}\n", shape.depth));
            }
        }
        Ok(out)
    }
}

/// Index of the first maximum; `None` for an empty slice.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ─── Predictions ───────────────────────────────────────────────────

/// One model output, from either the reference runtime or generated code.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prediction {
    Value {
        value: f64,
    },
    Class {
        class: i64,
        /// Probability of the positive class, when the model reports one.
        probability: Option<f64>,
    },
}

impl Prediction {
    /// The number compared across implementations: the regression value or
    /// the positive-class probability.
    pub fn score(&self) -> Option<f64> {
        match *self {
            Prediction::Value { value } => Some(value),
            Prediction::Class { probability, .. } => probability,
        }
    }

    pub fn class(&self) -> Option<i64> {
        match *self {
            Prediction::Value { .. } => None,
            Prediction::Class { class, .. } => Some(class),
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Value { value } => write!(f, "{:.6}", value),
            Prediction::Class {
                class,
                probability: Some(p),
            } => write!(f, "class {} (p = {:.6})", class, p),
            Prediction::Class {
                class,
                probability: None,
            } => write!(f, "class {}", class),
        }
    }
}

/// Ground-truth inference provided by the original model's runtime.
///
/// The verification harness only consumes this interface; it never looks
/// inside the model.
pub trait ReferenceModel: Sync {
    /// `None` when the runtime's model has no generator.
    fn family(&self) -> Option<ModelFamily>;
    /// Number of features an input vector must have.
    fn n_features(&self) -> usize;
    fn predict(&self, x: &[f64]) -> Result<Prediction>;
}

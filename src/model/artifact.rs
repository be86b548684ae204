//! JSON export of a trained model and its double-precision runtime.
//!
//! The export mirrors the training toolkit's public attributes
//! (`intercept_`, `coef_`, `tree_.children_left`, ...), so a one-line dump of
//! those attributes is all a producer needs to write. Nothing else about the
//! toolkit's object layout is reproduced.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{argmax_first, ModelFamily, Prediction, ReferenceModel};
use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};
use crate::span::Span;

/// `intercept_`: a scalar for regressors, one entry per class row otherwise.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Intercept {
    Scalar(f64),
    PerClass(Vec<f64>),
}

/// `coef_`: a vector for regressors, a class-by-feature matrix otherwise.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Coefficients {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

/// `tree_.value`: per node, per output, per class. A flattened
/// single-output form (per node, per class) is accepted too.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NodeValues {
    PerOutput(Vec<Vec<Vec<f64>>>),
    SingleOutput(Vec<Vec<f64>>),
}

impl NodeValues {
    pub fn len(&self) -> usize {
        match self {
            NodeValues::PerOutput(v) => v.len(),
            NodeValues::SingleOutput(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class distribution of a node for the first (only supported) output.
    pub fn class_counts(&self, node: usize) -> Option<&[f64]> {
        match self {
            NodeValues::PerOutput(v) => v.get(node)?.first().map(Vec::as_slice),
            NodeValues::SingleOutput(v) => v.get(node).map(Vec::as_slice),
        }
    }
}

/// Parallel node arrays of a fitted decision tree.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TreeArrays {
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub value: NodeValues,
}

impl TreeArrays {
    pub fn node_count(&self) -> usize {
        self.feature.len()
    }
}

/// A trained model as exported by the training side.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ModelArtifact {
    /// Class name of the estimator, e.g. `LinearRegression`.
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features_in_: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intercept_: Option<Intercept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coef_: Option<Coefficients>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_: Option<TreeArrays>,
    /// Optional verification vectors shipped with the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_vectors: Vec<Vec<f64>>,
    /// The toolkit's own `predict` output for each test vector: the value
    /// for regressors, the class label for classifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<f64>,
}

impl ModelArtifact {
    /// Load an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let artifact = Self::from_json(&source).map_err(|diagnostic| Error::Artifact {
            path: path.to_path_buf(),
            source_text: source.clone(),
            diagnostic,
        })?;
        debug!(
            path = %path.display(),
            model_type = %artifact.model_type,
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Parse an artifact from JSON text, locating syntax errors.
    pub fn from_json(source: &str) -> std::result::Result<Self, Diagnostic> {
        serde_json::from_str(source).map_err(|e| {
            let span = Span::from_line_col(source, e.line(), e.column());
            Diagnostic::error(e.to_string(), span)
                .with_label("artifact stops parsing here")
                .with_help("expected an object with `model_type` and the estimator's fitted attributes")
        })
    }

    pub fn model_family(&self) -> Result<ModelFamily> {
        ModelFamily::from_tag(&self.model_type)
            .ok_or_else(|| Error::UnsupportedModelKind(self.model_type.clone()))
    }

    /// Warnings for exported fields the family never reads.
    pub fn lint(&self, source: &str) -> Vec<Diagnostic> {
        let Ok(family) = self.model_family() else {
            return Vec::new();
        };
        let mut ignored = Vec::new();
        match family {
            ModelFamily::Linear | ModelFamily::Logistic => {
                if self.tree_.is_some() {
                    ignored.push("tree_");
                }
            }
            ModelFamily::Tree => {
                if self.coef_.is_some() {
                    ignored.push("coef_");
                }
                if self.intercept_.is_some() {
                    ignored.push("intercept_");
                }
            }
        }
        ignored
            .into_iter()
            .map(|field| {
                let quoted = format!("\"{}\"", field);
                let span = source
                    .find(&quoted)
                    .map(|at| Span::new(at as u32, (at + quoted.len()) as u32))
                    .unwrap_or_else(Span::dummy);
                Diagnostic::warning(format!("field `{}` is ignored for {}", field, family), span)
                    .with_label("not read")
                    .with_note(format!("generated code reads only the {} fields", family))
            })
            .collect()
    }

    /// Check the reference runtime against the outputs the toolkit recorded
    /// for `test_vectors`. Passes trivially when nothing was recorded.
    pub fn check_recorded(&self) -> Result<()> {
        if self.expected.is_empty() {
            return Ok(());
        }
        if self.expected.len() != self.test_vectors.len() {
            return Err(Error::MalformedParameters(format!(
                "`expected` has {} entries for {} test vectors",
                self.expected.len(),
                self.test_vectors.len()
            )));
        }
        for (i, (x, &recorded)) in self.test_vectors.iter().zip(&self.expected).enumerate() {
            let ours = self.predict(x)?;
            let agrees = match ours {
                Prediction::Value { value } => {
                    (value - recorded).abs() <= 1e-9 * recorded.abs().max(1.0)
                }
                Prediction::Class { class, .. } => class as f64 == recorded,
            };
            if !agrees {
                return Err(Error::MalformedParameters(format!(
                    "test vector {}: toolkit recorded {} but the reference runtime gives {}",
                    i + 1,
                    recorded,
                    ours
                )));
            }
        }
        debug!(vectors = self.expected.len(), "reference agrees with recorded outputs");
        Ok(())
    }

    // ─── Parameter access ──────────────────────────────────────────

    /// Intercept and coefficient row of a linear or binary logistic model.
    pub(crate) fn linear_parameters(&self) -> Result<(f64, Vec<f64>)> {
        let intercept = match &self.intercept_ {
            Some(Intercept::Scalar(b)) => *b,
            Some(Intercept::PerClass(row)) if row.len() == 1 => row[0],
            Some(Intercept::PerClass(row)) => {
                return Err(Error::MalformedParameters(format!(
                    "expected a single intercept, found {} (multi-class models are not supported)",
                    row.len()
                )))
            }
            None => {
                return Err(Error::MalformedParameters(
                    "missing `intercept_`".to_string(),
                ))
            }
        };
        let coefficients = match &self.coef_ {
            Some(Coefficients::Vector(v)) => v.clone(),
            Some(Coefficients::Matrix(rows)) if rows.len() <= 1 => {
                rows.first().cloned().unwrap_or_default()
            }
            Some(Coefficients::Matrix(rows)) => {
                return Err(Error::MalformedParameters(format!(
                    "expected one coefficient row, found {} (multi-class models are not supported)",
                    rows.len()
                )))
            }
            None => return Err(Error::MalformedParameters("missing `coef_`".to_string())),
        };
        Ok((intercept, coefficients))
    }

    pub(crate) fn tree_arrays(&self) -> Result<&TreeArrays> {
        self.tree_
            .as_ref()
            .ok_or_else(|| Error::MalformedParameters("missing `tree_`".to_string()))
    }

    /// Walk the tree arrays from the root and return the leaf reached.
    fn find_leaf(&self, x: &[f64]) -> Result<usize> {
        let tree = self.tree_arrays()?;
        let n = tree.node_count();
        let mut node = 0usize;
        // A path longer than the node count means a cycle.
        for _ in 0..=n {
            let feature = *tree
                .feature
                .get(node)
                .ok_or_else(|| Error::MalformedTree(format!("node {} out of range", node)))?;
            if feature < 0 {
                return Ok(node);
            }
            let value = x.get(feature as usize).copied().ok_or_else(|| {
                Error::MalformedParameters(format!(
                    "input has {} features, node {} reads feature {}",
                    x.len(),
                    node,
                    feature
                ))
            })?;
            let threshold = tree.threshold.get(node).copied().unwrap_or(f64::NAN);
            // The toolkit casts inputs to single precision before the split
            // test; thresholds stay double.
            let next = if (value as f32) as f64 <= threshold {
                tree.children_left.get(node)
            } else {
                tree.children_right.get(node)
            };
            node = match next {
                Some(&c) if c >= 0 => c as usize,
                _ => {
                    return Err(Error::MalformedTree(format!(
                        "node {} has no valid child",
                        node
                    )))
                }
            };
        }
        Err(Error::MalformedTree(
            "walk did not reach a leaf (cycle)".to_string(),
        ))
    }

    /// Class probabilities, as the toolkit's `predict_proba`.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        match self.model_family()? {
            ModelFamily::Linear => Err(Error::MalformedParameters(
                "regressors have no class probabilities".to_string(),
            )),
            ModelFamily::Logistic => {
                let p = sigmoid(self.decision_function(x)?);
                Ok(vec![1.0 - p, p])
            }
            ModelFamily::Tree => {
                let leaf = self.find_leaf(x)?;
                let counts = self
                    .tree_arrays()?
                    .value
                    .class_counts(leaf)
                    .unwrap_or_default();
                let total: f64 = counts.iter().sum();
                if total <= 0.0 {
                    return Ok(counts.to_vec());
                }
                Ok(counts.iter().map(|c| c / total).collect())
            }
        }
    }

    /// `intercept + coef · x` in double precision.
    pub fn decision_function(&self, x: &[f64]) -> Result<f64> {
        let (intercept, coefficients) = self.linear_parameters()?;
        if x.len() != coefficients.len() {
            return Err(Error::MalformedParameters(format!(
                "input has {} features, model expects {}",
                x.len(),
                coefficients.len()
            )));
        }
        Ok(intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ReferenceModel for ModelArtifact {
    fn family(&self) -> Option<ModelFamily> {
        ModelFamily::from_tag(&self.model_type)
    }

    fn n_features(&self) -> usize {
        if let Some(n) = self.n_features_in_ {
            return n;
        }
        match (&self.coef_, &self.tree_) {
            (Some(Coefficients::Vector(v)), _) => v.len(),
            (Some(Coefficients::Matrix(rows)), _) => rows.first().map_or(0, Vec::len),
            (None, Some(tree)) => tree
                .feature
                .iter()
                .filter(|&&f| f >= 0)
                .map(|&f| f as usize + 1)
                .max()
                .unwrap_or(0),
            (None, None) => 0,
        }
    }

    fn predict(&self, x: &[f64]) -> Result<Prediction> {
        match self.model_family()? {
            ModelFamily::Linear => Ok(Prediction::Value {
                value: self.decision_function(x)?,
            }),
            ModelFamily::Logistic => {
                let p = self.predict_proba(x)?[1];
                Ok(Prediction::Class {
                    class: if p >= 0.5 { 1 } else { 0 },
                    probability: Some(p),
                })
            }
            ModelFamily::Tree => {
                let leaf = self.find_leaf(x)?;
                let counts = self.tree_arrays()?.value.class_counts(leaf).unwrap_or_default();
                let class = argmax_first(counts).ok_or_else(|| {
                    Error::MalformedTree(format!("leaf {} has no class counts", leaf))
                })?;
                Ok(Prediction::Class {
                    class: class as i64,
                    probability: None,
                })
            }
        }
    }
}

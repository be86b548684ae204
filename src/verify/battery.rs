//! Test vectors for the verification harness.
//!
//! Callers may supply vectors; otherwise a deterministic battery is derived
//! from the descriptor. For trees the battery holds one vector per reachable
//! leaf, so every `return` in the generated code is executed at least once.

use std::path::Path;

use tracing::{debug, warn};

use crate::codegen::{narrow, narrow_threshold, tree_shape};
use crate::error::{Error, Result};
use crate::model::{ModelDescriptor, TreeNode, MAX_FEATURES};

/// Load vectors from a JSON file holding an array of arrays.
pub fn load_vectors(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| {
        Error::MalformedParameters(format!(
            "test vectors in '{}' must be an array of number arrays: {}",
            path.display(),
            e
        ))
    })
}

/// Every vector must be finite and exactly `n_features` wide.
pub fn validate(vectors: &[Vec<f64>], n_features: usize) -> Result<()> {
    if vectors.is_empty() {
        return Err(Error::MalformedParameters(
            "no test vectors to verify with".to_string(),
        ));
    }
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != n_features {
            return Err(Error::MalformedParameters(format!(
                "test vector {} has {} values, the model expects {}",
                i + 1,
                v.len(),
                n_features
            )));
        }
        if let Some(bad) = v.iter().find(|x| !x.is_finite()) {
            return Err(Error::MalformedParameters(format!(
                "test vector {} contains a non-finite value ({})",
                i + 1,
                bad
            )));
        }
    }
    Ok(())
}

/// Deterministic default battery for a descriptor.
pub fn default_battery(descriptor: &ModelDescriptor, n_features: usize) -> Result<Vec<Vec<f64>>> {
    if n_features > MAX_FEATURES {
        return Err(Error::MalformedParameters(format!(
            "cannot build test vectors {} features wide",
            n_features
        )));
    }
    let vectors = match descriptor {
        ModelDescriptor::Linear { .. } | ModelDescriptor::Logistic { .. } => {
            linear_battery(n_features)
        }
        ModelDescriptor::Tree { nodes } => leaf_covering(nodes, n_features)?,
    };
    debug!(vectors = vectors.len(), "derived default test battery");
    Ok(vectors)
}

/// Zero, ones, each unit vector, and an alternating-sign ramp.
fn linear_battery(n: usize) -> Vec<Vec<f64>> {
    let mut vectors = vec![vec![0.0; n], vec![1.0; n]];
    for i in 0..n {
        let mut unit = vec![0.0; n];
        unit[i] = 1.0;
        vectors.push(unit);
    }
    vectors.push(
        (0..n)
            .map(|i| {
                let magnitude = (i + 1) as f64;
                if i % 2 == 0 {
                    magnitude
                } else {
                    -magnitude
                }
            })
            .collect(),
    );
    vectors
}

/// Open/closed bounds a root-to-leaf path puts on one feature:
/// `lower < x <= upper`.
#[derive(Clone, Copy, Debug, Default)]
struct Interval {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl Interval {
    /// The toolkit's view: the input is single precision, bounds are double.
    fn contains(&self, x: f64) -> bool {
        let x = (x as f32) as f64;
        self.lower.map_or(true, |l| x > l) && self.upper.map_or(true, |u| x <= u)
    }

    /// The generated code's view: both sides are single precision.
    fn contains_narrowed(&self, x: f64) -> bool {
        let Ok(x) = narrow(x) else {
            return false;
        };
        let lower = self.lower.map(|l| narrow_threshold(l).ok());
        let upper = self.upper.map(|u| narrow_threshold(u).ok());
        let above = match lower {
            None => true,
            Some(Some(l)) => x > l,
            Some(None) => false,
        };
        let below = match upper {
            None => true,
            Some(Some(u)) => x <= u,
            Some(None) => false,
        };
        above && below
    }

    /// A value inside the interval on both precisions. The upper bound and
    /// the largest float under it are tried first so `<=` is exercised at
    /// the threshold.
    fn pick(&self) -> Option<f64> {
        let floor = |u: f64| narrow_threshold(u).map(f64::from).unwrap_or(u);
        let candidates = match (self.lower, self.upper) {
            (None, None) => vec![0.0],
            (None, Some(u)) => vec![u, floor(u), u - 1.0],
            (Some(l), None) => vec![l + 1.0, l + l.abs() * 1e-3 + 1.0],
            (Some(l), Some(u)) => vec![u, floor(u), l + (u - l) / 2.0],
        };
        candidates
            .into_iter()
            .find(|&x| self.contains(x) && self.contains_narrowed(x))
    }
}

/// One vector per reachable leaf, each steering the tree into that leaf.
fn leaf_covering(nodes: &[TreeNode], n_features: usize) -> Result<Vec<Vec<f64>>> {
    tree_shape(nodes)?;
    let mut vectors = Vec::new();
    let mut bounds = vec![Interval::default(); n_features];
    collect_leaf_vectors(nodes, 0, &mut bounds, &mut vectors)?;
    if vectors.is_empty() {
        return Err(Error::MalformedParameters(
            "could not derive a test vector for any leaf".to_string(),
        ));
    }
    Ok(vectors)
}

fn collect_leaf_vectors(
    nodes: &[TreeNode],
    index: usize,
    bounds: &mut [Interval],
    out: &mut Vec<Vec<f64>>,
) -> Result<()> {
    let node = &nodes[index];
    if node.is_leaf() {
        let picked: Option<Vec<f64>> = bounds.iter().map(Interval::pick).collect();
        match picked {
            Some(v) => out.push(v),
            None => warn!(leaf = index, "no representable input reaches this leaf"),
        }
        return Ok(());
    }
    let feature = node.feature_index as usize;
    let saved = *bounds.get(feature).ok_or_else(|| {
        Error::MalformedParameters(format!(
            "node {} splits on feature {} but vectors have {} features",
            index, feature, bounds.len()
        ))
    })?;
    let t = node.threshold;

    // Left: x <= t.
    bounds[feature].upper = Some(saved.upper.map_or(t, |u| u.min(t)));
    if feasible(&bounds[feature]) {
        collect_leaf_vectors(nodes, node.left_child, bounds, out)?;
    }
    bounds[feature] = saved;

    // Right: x > t.
    bounds[feature].lower = Some(saved.lower.map_or(t, |l| l.max(t)));
    if feasible(&bounds[feature]) {
        collect_leaf_vectors(nodes, node.right_child, bounds, out)?;
    }
    bounds[feature] = saved;
    Ok(())
}

/// Leaves behind contradictory splits can never be reached.
fn feasible(interval: &Interval) -> bool {
    match (interval.lower, interval.upper) {
        (Some(l), Some(u)) => l < u,
        _ => true,
    }
}

use tracing::debug;

use super::{ModelArtifact, ModelDescriptor, ModelFamily, TreeNode};
use crate::error::{Error, Result};

/// Widest input vector a model may declare. Test batteries and drivers
/// allocate one row of this width per vector.
pub const MAX_FEATURES: usize = 1 << 20;

/// Extract the normalized descriptor from a trained model artifact.
///
/// Pure: the artifact is only read. Fails with `UnsupportedModelKind` for
/// families without a generator and `MalformedParameters` when parameter
/// arrays are empty, non-finite, or disagree with the declared feature count.
pub fn extract(artifact: &ModelArtifact) -> Result<ModelDescriptor> {
    let family = artifact.model_family()?;
    if let Some(declared) = artifact.n_features_in_ {
        if declared > MAX_FEATURES {
            return Err(Error::MalformedParameters(format!(
                "model declares {} features, more than the supported {}",
                declared, MAX_FEATURES
            )));
        }
    }
    let descriptor = match family {
        ModelFamily::Linear => {
            let (intercept, coefficients) = checked_linear(artifact)?;
            ModelDescriptor::Linear {
                intercept,
                coefficients,
            }
        }
        ModelFamily::Logistic => {
            let (intercept, coefficients) = checked_linear(artifact)?;
            ModelDescriptor::Logistic {
                intercept,
                coefficients,
            }
        }
        ModelFamily::Tree => ModelDescriptor::Tree {
            nodes: tree_nodes(artifact)?,
        },
    };
    debug!(
        family = %family,
        features = descriptor.n_features(),
        "extracted model descriptor"
    );
    Ok(descriptor)
}

fn checked_linear(artifact: &ModelArtifact) -> Result<(f64, Vec<f64>)> {
    let (intercept, coefficients) = artifact.linear_parameters()?;
    if coefficients.is_empty() {
        return Err(Error::MalformedParameters(
            "`coef_` is empty".to_string(),
        ));
    }
    if let Some(declared) = artifact.n_features_in_ {
        if declared != coefficients.len() {
            return Err(Error::MalformedParameters(format!(
                "`coef_` has {} entries but the model declares {} features",
                coefficients.len(),
                declared
            )));
        }
    }
    if !intercept.is_finite() {
        return Err(Error::MalformedParameters(format!(
            "intercept is not finite ({})",
            intercept
        )));
    }
    if let Some(i) = coefficients.iter().position(|c| !c.is_finite()) {
        return Err(Error::MalformedParameters(format!(
            "coefficient {} is not finite ({})",
            i, coefficients[i]
        )));
    }
    Ok((intercept, coefficients))
}

fn tree_nodes(artifact: &ModelArtifact) -> Result<Vec<TreeNode>> {
    let tree = artifact.tree_arrays()?;
    // Split indices are only bounded by the declared width.
    let declared = artifact.n_features_in_.ok_or_else(|| {
        Error::MalformedParameters("trees must declare `n_features_in_`".to_string())
    })?;
    let n = tree.node_count();
    if n == 0 {
        return Err(Error::MalformedParameters(
            "`tree_` has no nodes".to_string(),
        ));
    }
    let lengths = [
        ("threshold", tree.threshold.len()),
        ("children_left", tree.children_left.len()),
        ("children_right", tree.children_right.len()),
        ("value", tree.value.len()),
    ];
    for (name, len) in lengths {
        if len != n {
            return Err(Error::MalformedParameters(format!(
                "`tree_.{}` has {} entries, `tree_.feature` has {}",
                name, len, n
            )));
        }
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let counts = tree.value.class_counts(i).unwrap_or_default().to_vec();
        if counts.iter().any(|c| !c.is_finite()) {
            return Err(Error::MalformedParameters(format!(
                "node {} has non-finite class counts",
                i
            )));
        }
        let feature = tree.feature[i];
        if feature < 0 {
            if counts.is_empty() {
                return Err(Error::MalformedParameters(format!(
                    "leaf {} has no class counts",
                    i
                )));
            }
            nodes.push(TreeNode::leaf(counts));
            continue;
        }
        if !tree.threshold[i].is_finite() {
            return Err(Error::MalformedParameters(format!(
                "node {} has a non-finite threshold ({})",
                i, tree.threshold[i]
            )));
        }
        if feature as u64 >= declared as u64 {
            return Err(Error::MalformedParameters(format!(
                "node {} splits on feature {} but the model declares {} features",
                i, feature, declared
            )));
        }
        let child = |c: i64, side: &str| -> Result<usize> {
            usize::try_from(c).map_err(|_| {
                Error::MalformedTree(format!("internal node {} has no {} child ({})", i, side, c))
            })
        };
        nodes.push(TreeNode {
            feature_index: feature,
            threshold: tree.threshold[i],
            left_child: child(tree.children_left[i], "left")?,
            right_child: child(tree.children_right[i], "right")?,
            class_counts: counts,
        });
    }
    Ok(nodes)
}

//! Decision tree → nested C conditionals.
//!
//! The node arena is walked recursively from index 0. Every internal node
//! becomes `if (features[f] <= t) { left } else { right }` and every leaf a
//! `return` of its class, so the control flow of `predict` has exactly the
//! shape of the tree and can be audited against it node by node.
//!
//! The arena is validated by `tree_shape` before any code is written: child
//! indices must be in range and no node may be reached twice. A malformed
//! arena therefore fails fast instead of recursing forever.

use super::literal::threshold_literal;
use super::writer::CWriter;
use super::header;
use crate::error::{Error, Result};
use crate::model::{ModelFamily, TreeNode};

/// Structural statistics of a validated tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeShape {
    /// Nodes reachable from the root.
    pub nodes: usize,
    pub leaves: usize,
    /// Edges on the longest root-to-leaf path.
    pub depth: usize,
}

/// Validate the arena and measure it.
///
/// Fails with `MalformedTree` for an empty arena, an out-of-range child, a
/// node reached twice (cycle or shared subtree), or a leaf without class
/// counts.
pub fn tree_shape(nodes: &[TreeNode]) -> Result<TreeShape> {
    if nodes.is_empty() {
        return Err(Error::MalformedTree("tree has no nodes".to_string()));
    }
    let mut visited = vec![false; nodes.len()];
    let mut shape = TreeShape {
        nodes: 0,
        leaves: 0,
        depth: 0,
    };
    // (node, parent, depth); parent is only used for error messages.
    let mut stack = vec![(0usize, None::<usize>, 0usize)];
    while let Some((index, parent, depth)) = stack.pop() {
        let node = nodes.get(index).ok_or_else(|| {
            Error::MalformedTree(format!(
                "node {} references child {} but the tree has {} nodes",
                parent.unwrap_or(0),
                index,
                nodes.len()
            ))
        })?;
        if visited[index] {
            return Err(Error::MalformedTree(format!(
                "node {} is reached more than once (cycle or shared subtree)",
                index
            )));
        }
        visited[index] = true;
        shape.nodes += 1;
        shape.depth = shape.depth.max(depth);
        if node.is_leaf() {
            if node.class_counts.is_empty() {
                return Err(Error::MalformedTree(format!(
                    "leaf {} has no class counts",
                    index
                )));
            }
            shape.leaves += 1;
        } else {
            stack.push((node.right_child, Some(index), depth + 1));
            stack.push((node.left_child, Some(index), depth + 1));
        }
    }
    Ok(shape)
}

/// `int predict(const float *features)` mirroring the tree.
pub(super) fn generate(nodes: &[TreeNode]) -> Result<String> {
    let shape = tree_shape(nodes)?;

    let mut w = CWriter::new();
    header(
        &mut w,
        &format!(
            "{}, {} nodes, {} leaves, depth {}",
            ModelFamily::Tree,
            shape.nodes,
            shape.leaves,
            shape.depth
        ),
        "Thresholds",
    );
    w.blank();
    w.open("int predict(const float *features) {");
    emit_node(&mut w, nodes, 0)?;
    w.close("}");
    Ok(w.finish())
}

/// Emit one subtree. Recursion depth equals tree depth; `tree_shape` has
/// already ruled out cycles and dangling children.
fn emit_node(w: &mut CWriter, nodes: &[TreeNode], index: usize) -> Result<()> {
    let node = &nodes[index];
    if node.is_leaf() {
        let class = node.predicted_class().ok_or_else(|| {
            Error::MalformedTree(format!("leaf {} has no class counts", index))
        })?;
        w.line(&format!("return {};", class));
        return Ok(());
    }
    w.open(&format!(
        "if (features[{}] <= {}) {{",
        node.feature_index,
        threshold_literal(node.threshold)?
    ));
    emit_node(w, nodes, node.left_child)?;
    w.reopen("} else {");
    emit_node(w, nodes, node.right_child)?;
    w.close("}");
    Ok(())
}

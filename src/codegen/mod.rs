//! C code generation from model descriptors.
//!
//! One generator per model family, selected by matching on the descriptor.
//! Generators are pure: the same descriptor always yields byte-identical
//! source, and nothing is written to disk here.

mod linear;
mod literal;
mod logistic;
mod tree;
pub(crate) mod writer;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use literal::{float_literal, narrow, narrow_threshold, threshold_literal};
pub use tree::{tree_shape, TreeShape};

use crate::error::{Error, Result};
use crate::model::{ModelDescriptor, ModelFamily};
use writer::CWriter;

/// Generated C source for one model.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedSource {
    pub family: ModelFamily,
    /// Length of the input array the generated `predict` reads.
    pub n_features: usize,
    /// Conventional file name, e.g. `linear_model.c`.
    pub file_name: String,
    pub code: String,
}

impl GeneratedSource {
    /// BLAKE3 hash of the source bytes.
    pub fn content_hash(&self) -> blake3::Hash {
        blake3::hash(self.code.as_bytes())
    }

    /// Write the source into `dir` under its conventional name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.code).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), bytes = self.code.len(), "wrote generated source");
        Ok(path)
    }
}

/// Generate C source for a descriptor.
pub fn generate(descriptor: &ModelDescriptor) -> Result<GeneratedSource> {
    let code = match descriptor {
        ModelDescriptor::Linear {
            intercept,
            coefficients,
        } => linear::generate(*intercept, coefficients)?,
        ModelDescriptor::Logistic {
            intercept,
            coefficients,
        } => logistic::generate(*intercept, coefficients)?,
        ModelDescriptor::Tree { nodes } => {
            let reachable = tree_shape(nodes)?.nodes;
            if reachable < nodes.len() {
                warn!(
                    unreachable = nodes.len() - reachable,
                    "tree has nodes unreachable from the root"
                );
            }
            tree::generate(nodes)?
        }
    };
    let family = descriptor.family();
    debug!(family = %family, bytes = code.len(), "generated source");
    Ok(GeneratedSource {
        family,
        n_features: descriptor.n_features(),
        file_name: family.output_file_name().to_string(),
        code,
    })
}

/// Leading comment shared by all generated files.
fn header(w: &mut CWriter, what: &str, narrowed: &str) {
    w.line(&format!("/* Generated by modelc: {}. */", what));
    w.line(&format!(
        "/* {} are narrowed to single precision. */",
        narrowed
    ));
}

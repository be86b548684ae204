//! modelc: compile trained linear, logistic and decision-tree models into
//! dependency-free C, and check the generated code against the model.

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod model;
pub mod span;
pub mod verify;

use std::path::Path;

pub use codegen::{generate, GeneratedSource};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{extract, ModelArtifact, ModelDescriptor, ModelFamily, Prediction, ReferenceModel};
pub use verify::{verify, verify_artifact, verify_many, VerificationReport, Verdict, VerifyOptions};

/// Extract and generate in one step.
pub fn transpile(artifact: &ModelArtifact) -> Result<GeneratedSource> {
    let descriptor = extract(artifact)?;
    generate(&descriptor)
}

/// Load an artifact file and transpile it.
pub fn transpile_file(path: &Path) -> Result<GeneratedSource> {
    transpile(&ModelArtifact::load(path)?)
}

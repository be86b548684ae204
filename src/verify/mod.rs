//! Verification harness: compile the generated source, run it over test
//! vectors, and compare every output with the reference runtime.
//!
//! The harness never reads the model itself. Ground truth comes through
//! `ReferenceModel`, and the compiler sits behind `Toolchain`.

pub mod battery;
pub mod driver;
pub mod report;
pub mod toolchain;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::codegen::{self, GeneratedSource};
use crate::error::{Error, Result};
use crate::model::{self, ModelArtifact, Prediction, ReferenceModel};

pub use battery::{default_battery, load_vectors};
pub use report::{batch_json, CaseResult, Tolerances, VerificationReport, Verdict};
pub use toolchain::{CcToolchain, Toolchain};

/// How a verification run treats its scratch files and results.
#[derive(Clone, Debug, Default)]
pub struct VerifyOptions {
    pub tolerances: Tolerances,
    /// Keep the generated source, driver and binary after the run.
    pub keep_artifacts: bool,
    /// Parent of the scratch directory; the system temp dir when unset.
    pub work_dir: Option<PathBuf>,
}

/// Verify `source` against `reference` on `vectors`.
///
/// Build and execute failures are errors. A numeric disagreement is not: it
/// comes back as a report with a `Mismatch` verdict.
pub fn verify(
    reference: &dyn ReferenceModel,
    source: &GeneratedSource,
    vectors: &[Vec<f64>],
    toolchain: &dyn Toolchain,
    options: &VerifyOptions,
    label: &str,
) -> Result<VerificationReport> {
    match reference.family() {
        Some(family) if family == source.family => {}
        Some(family) => {
            return Err(Error::MalformedParameters(format!(
                "reference model is {} but the generated source is {}",
                family, source.family
            )))
        }
        None => {
            return Err(Error::UnsupportedModelKind(format!(
                "reference model for {}",
                label
            )))
        }
    }
    let width = reference.n_features();
    if width < source.n_features {
        return Err(Error::MalformedParameters(format!(
            "generated source reads {} features but the model takes {}",
            source.n_features, width
        )));
    }
    battery::validate(vectors, width)?;

    // Ground truth first, so a reference failure costs no compile.
    let expected = vectors
        .iter()
        .map(|v| reference.predict(v))
        .collect::<Result<Vec<Prediction>>>()?;

    let scratch = scratch_dir(options.work_dir.as_deref())?;
    let dir = scratch.path();
    source.write_to(dir)?;
    let driver_path = dir.join(driver::DRIVER_FILE);
    let driver_code = driver::emit_driver(source, vectors)?;
    std::fs::write(&driver_path, driver_code).map_err(|e| Error::io(&driver_path, e))?;
    let binary = dir.join("driver");

    info!(model = label, family = %source.family, vectors = vectors.len(), "verifying");
    toolchain.build(&driver_path, &binary)?;
    let stdout = toolchain.execute(&binary)?;
    let actual = driver::parse_output(source.family, &stdout, vectors.len())?;

    let cases = vectors
        .iter()
        .zip(expected)
        .zip(actual)
        .map(|((input, expected), actual)| CaseResult::compare(input.clone(), expected, actual))
        .collect();
    let mut report = VerificationReport::new(
        label.to_string(),
        source.family,
        source.file_name.clone(),
        source.content_hash().to_hex().to_string(),
        cases,
        options.tolerances,
    );

    if options.keep_artifacts {
        let kept = scratch.into_path();
        debug!(dir = %kept.display(), "kept verification artifacts");
        report.artifact_dir = Some(kept);
    }
    match report.verdict {
        Verdict::Mismatch => warn!(model = label, max_diff = report.max_diff, "mismatch"),
        verdict => info!(model = label, %verdict, max_diff = report.max_diff, "verified"),
    }
    Ok(report)
}

/// Extract, generate and verify one artifact.
///
/// Vectors come from `vectors` when given, then from the artifact's own
/// `test_vectors`, then from the default battery. Outputs the toolkit
/// recorded alongside its vectors must agree with the reference runtime
/// before anything is compiled.
pub fn verify_artifact(
    artifact: &ModelArtifact,
    vectors: Option<&[Vec<f64>]>,
    toolchain: &dyn Toolchain,
    options: &VerifyOptions,
    label: &str,
) -> Result<VerificationReport> {
    let descriptor = model::extract(artifact)?;
    let source = codegen::generate(&descriptor)?;
    let width = artifact.n_features();
    let derived;
    let vectors = match vectors {
        Some(v) => v,
        None if !artifact.test_vectors.is_empty() => {
            artifact.check_recorded()?;
            &artifact.test_vectors
        }
        None => {
            derived = default_battery(&descriptor, width)?;
            &derived
        }
    };
    verify(artifact, &source, vectors, toolchain, options, label)
}

/// Verify several artifact files in parallel, one result per path in input
/// order.
pub fn verify_many(
    paths: &[PathBuf],
    vectors: Option<&[Vec<f64>]>,
    toolchain: &dyn Toolchain,
    options: &VerifyOptions,
) -> Vec<Result<VerificationReport>> {
    paths
        .par_iter()
        .map(|path| {
            let artifact = ModelArtifact::load(path)?;
            verify_artifact(
                &artifact,
                vectors,
                toolchain,
                options,
                &path.display().to_string(),
            )
        })
        .collect()
}

fn scratch_dir(parent: Option<&Path>) -> Result<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("modelc-");
    match parent {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            builder.tempdir_in(parent).map_err(|e| Error::io(parent, e))
        }
        None => builder
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e)),
    }
}

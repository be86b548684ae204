//! Verification verdicts and reports.
//!
//! A report carries one row per test vector and a single verdict. The text
//! form is for people; `to_json` is for CI.


use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{ModelFamily, Prediction};

// ─── Verdict ───────────────────────────────────────────────────────

/// Difference bands shared by every verification run under one config.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Tolerances {
    /// Differences strictly below this are a match.
    pub match_below: f64,
    /// Differences strictly below this (and not a match) are a warning.
    pub warn_below: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            match_below: 1e-5,
            warn_below: 1e-3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Within the drift parameter narrowing alone explains.
    Match,
    /// Within single- vs double-precision arithmetic drift.
    Warning,
    /// A logic defect in the generated procedure.
    Mismatch,
}

impl Verdict {
    /// Band a maximum difference. Any class disagreement, or a difference
    /// that is not a number, is a mismatch.
    pub fn classify(max_diff: f64, classes_agree: bool, tolerances: &Tolerances) -> Self {
        if !classes_agree || max_diff.is_nan() {
            return Verdict::Mismatch;
        }
        if max_diff < tolerances.match_below {
            Verdict::Match
        } else if max_diff < tolerances.warn_below {
            Verdict::Warning
        } else {
            Verdict::Mismatch
        }
    }

    pub fn passed(self) -> bool {
        !matches!(self, Verdict::Mismatch)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "MATCH"),
            Verdict::Warning => write!(f, "WARNING"),
            Verdict::Mismatch => write!(f, "MISMATCH"),
        }
    }
}

// ─── Report ────────────────────────────────────────────────────────

/// One test vector run through both implementations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaseResult {
    pub input: Vec<f64>,
    pub expected: Prediction,
    pub actual: Prediction,
    /// Absolute difference of the compared score (0 when neither side
    /// reports one).
    pub diff: f64,
    /// Class agreement; `None` for regressors.
    pub class_match: Option<bool>,
}

impl CaseResult {
    pub fn compare(input: Vec<f64>, expected: Prediction, actual: Prediction) -> Self {
        let diff = match (expected.score(), actual.score()) {
            (Some(a), Some(b)) => (a - b).abs(),
            (None, None) => 0.0,
            _ => f64::NAN,
        };
        let class_match = match (expected.class(), actual.class()) {
            (Some(a), Some(b)) => Some(a == b),
            (None, None) => None,
            _ => Some(false),
        };
        Self {
            input,
            expected,
            actual,
            diff,
            class_match,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct VerificationReport {
    /// Human label for the model (usually the artifact path).
    pub model: String,
    pub family: ModelFamily,
    pub source_file: String,
    /// BLAKE3 hash of the generated source, hex.
    pub source_hash: String,
    pub cases: Vec<CaseResult>,
    pub max_diff: f64,
    pub classes_agree: bool,
    pub tolerances: Tolerances,
    pub verdict: Verdict,
    /// Where the generated files were kept, if they were.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}

impl VerificationReport {
    pub fn new(
        model: String,
        family: ModelFamily,
        source_file: String,
        source_hash: String,
        cases: Vec<CaseResult>,
        tolerances: Tolerances,
    ) -> Self {
        let max_diff = cases.iter().map(|c| c.diff).fold(0.0f64, |acc, d| {
            if d.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(d)
            }
        });
        let classes_agree = cases.iter().all(|c| c.class_match != Some(false));
        let verdict = Verdict::classify(max_diff, classes_agree, &tolerances);
        Self {
            model,
            family,
            source_file,
            source_hash,
            cases,
            max_diff,
            classes_agree,
            tolerances,
            verdict,
            artifact_dir: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }

    /// Turn a mismatch verdict into `NumericMismatch`.
    pub fn ensure_passed(&self) -> Result<()> {
        if self.passed() {
            Ok(())
        } else {
            Err(Error::NumericMismatch {
                max_diff: self.max_diff,
                classes_agree: self.classes_agree,
            })
        }
    }

    /// Human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "Verification: {} ({}) vs {}\n",
            self.model, self.family, self.source_file
        ));
        report.push_str(&format!("  Source hash: {}\n", self.source_hash));
        for (i, case) in self.cases.iter().enumerate() {
            let input: Vec<String> = case.input.iter().map(|v| v.to_string()).collect();
            report.push_str(&format!("  Case {}: [{}]\n", i + 1, input.join(", ")));
            report.push_str(&format!("    original:  {}\n", case.expected));
            report.push_str(&format!("    generated: {}\n", case.actual));
            if self.family != ModelFamily::Tree {
                report.push_str(&format!("    diff:      {:.6e}\n", case.diff));
            }
            if let Some(agree) = case.class_match {
                report.push_str(&format!(
                    "    classes:   {}\n",
                    if agree { "agree" } else { "DIFFER" }
                ));
            }
        }
        if self.family != ModelFamily::Tree {
            report.push_str(&format!("  Max difference: {:.6e}\n", self.max_diff));
        }
        if self.family.is_classifier() {
            report.push_str(&format!(
                "  All classes agree: {}\n",
                if self.classes_agree { "yes" } else { "no" }
            ));
        }
        report.push_str(&format!("  Verdict: {}", self.verdict));
        match self.verdict {
            Verdict::Match => {
                report.push_str(&format!(
                    " (difference < {:e})\n",
                    self.tolerances.match_below
                ));
            }
            Verdict::Warning => {
                report.push_str(" (single- vs double-precision drift)\n");
            }
            Verdict::Mismatch => {
                report.push_str(" (generated code disagrees with the model)\n");
            }
        }
        if let Some(dir) = &self.artifact_dir {
            report.push_str(&format!("  Artifacts kept in {}\n", dir.display()));
        }
        report
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!("{{\"error\": {:?}}}", e.to_string())
        })
    }
}

/// JSON array with one entry per model, in input order. Models that could
/// not be verified appear as `{"model", "error"}` objects.
pub fn batch_json(paths: &[PathBuf], results: &[Result<VerificationReport>]) -> String {
    let entries: Vec<serde_json::Value> = paths
        .iter()
        .zip(results)
        .map(|(path, result)| match result {
            Ok(report) => serde_json::to_value(report).unwrap_or_else(|e| {
                serde_json::json!({ "model": report.model, "error": e.to_string() })
            }),
            Err(e) => serde_json::json!({
                "model": path.display().to_string(),
                "error": e.to_string(),
            }),
        })
        .collect();
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

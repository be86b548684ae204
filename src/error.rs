//! Error taxonomy for extraction, generation and verification.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The artifact names a model family with no generator.
    #[error(
        "unsupported model kind '{0}' (expected LinearRegression, LogisticRegression or DecisionTreeClassifier)"
    )]
    UnsupportedModelKind(String),

    #[error("malformed parameters: {0}")]
    MalformedParameters(String),

    #[error("model has no coefficients")]
    EmptyCoefficients,

    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// The C compiler rejected the generated source or the driver.
    #[error("build failed: `{command}`\n{stderr}")]
    BuildFailure { command: String, stderr: String },

    /// The built binary failed or printed something unparsable.
    #[error("execution failed: {reason}\n{stderr}")]
    ExecuteFailure { reason: String, stderr: String },

    #[error("numeric mismatch: max difference {max_diff:e} (classes agree: {classes_agree})")]
    NumericMismatch { max_diff: f64, classes_agree: bool },

    /// The artifact file is not valid JSON for the export format.
    #[error("invalid model artifact '{}': {}", .path.display(), .diagnostic.message)]
    Artifact {
        path: PathBuf,
        source_text: String,
        diagnostic: Diagnostic,
    },

    #[error("invalid configuration '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Structural errors are detected before anything is written to disk.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedModelKind(_)
                | Error::MalformedParameters(_)
                | Error::EmptyCoefficients
                | Error::MalformedTree(_)
        )
    }

    /// Render the error to stderr, with source context when it has any.
    pub fn render(&self) {
        match self {
            Error::Artifact {
                path,
                source_text,
                diagnostic,
            } => diagnostic.render(&path.to_string_lossy(), source_text),
            other => eprintln!("error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn test_structural_classification() {
        assert!(Error::EmptyCoefficients.is_structural());
        assert!(Error::MalformedTree("cycle".to_string()).is_structural());
        assert!(Error::UnsupportedModelKind("SVC".to_string()).is_structural());
        assert!(!Error::BuildFailure {
            command: "cc".to_string(),
            stderr: String::new(),
        }
        .is_structural());
        assert!(!Error::NumericMismatch {
            max_diff: 1.0,
            classes_agree: false,
        }
        .is_structural());
    }

    #[test]
    fn test_display_messages() {
        let e = Error::UnsupportedModelKind("RandomForestClassifier".to_string());
        assert!(e.to_string().contains("RandomForestClassifier"));

        let e = Error::Artifact {
            path: PathBuf::from("model.json"),
            source_text: "{".to_string(),
            diagnostic: Diagnostic::error("EOF while parsing".to_string(), Span::new(0, 1)),
        };
        assert_eq!(
            e.to_string(),
            "invalid model artifact 'model.json': EOF while parsing"
        );

        let e = Error::NumericMismatch {
            max_diff: 0.5,
            classes_agree: true,
        };
        assert!(e.to_string().contains("5e-1"));
    }
}

//! Tool configuration from modelc.toml.
//!
//! ```toml
//! [build]
//! cc = "clang"
//! flags = ["-O2", "-std=c99"]
//! libs = ["-lm"]
//! timeout_secs = 30
//!
//! [verify]
//! match_tolerance = 1e-5
//! warn_tolerance = 1e-3
//! keep_artifacts = false
//! work_dir = "target/modelc"
//! ```
//!
//! Every key is optional. `CC` in the environment overrides `build.cc`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::verify::{Tolerances, VerifyOptions};

pub const CONFIG_FILE: &str = "modelc.toml";

/// How to compile the verification driver.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
    pub compiler: String,
    pub flags: Vec<String>,
    pub libs: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: "cc".to_string(),
            flags: vec!["-O2".to_string(), "-std=c99".to_string()],
            libs: vec!["-lm".to_string()],
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VerifyConfig {
    pub tolerances: Tolerances,
    pub keep_artifacts: bool,
    /// Relative paths are resolved against the config file's directory.
    pub work_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub build: BuildConfig,
    pub verify: VerifyConfig,
}

/// Parse a minimal TOML string array: `["a", "b", "c"]` → `vec!["a", "b", "c"]`.
fn parse_string_array(s: &str) -> Option<Vec<String>> {
    let s = s.trim();
    if !s.starts_with('[') || !s.ends_with(']') {
        return None;
    }
    let inner = &s[1..s.len() - 1];
    Some(
        inner
            .split(',')
            .map(|part| part.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

impl Config {
    /// Load configuration from a modelc.toml file.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let root_dir = path.parent().unwrap_or(Path::new("."));
        let config = Self::parse(&content, root_dir).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Section-aware minimal TOML parsing.
    pub fn parse(content: &str, root_dir: &Path) -> std::result::Result<Config, String> {
        let mut config = Config::default();
        let mut section = String::new();

        for (number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("line {}: expected `key = value`", number + 1));
            };
            let key = key.trim().trim_matches('"');
            let value = value.trim();
            let at = |what: &str| format!("line {}: `{}` {}", number + 1, key, what);

            match (section.as_str(), key) {
                ("build", "cc") => config.build.compiler = value.trim_matches('"').to_string(),
                ("build", "flags") => {
                    config.build.flags =
                        parse_string_array(value).ok_or_else(|| at("must be a string array"))?
                }
                ("build", "libs") => {
                    config.build.libs =
                        parse_string_array(value).ok_or_else(|| at("must be a string array"))?
                }
                ("build", "timeout_secs") => {
                    config.build.timeout_secs = value
                        .parse()
                        .map_err(|_| at("must be a whole number of seconds"))?
                }
                ("verify", "match_tolerance") => {
                    config.verify.tolerances.match_below =
                        value.parse().map_err(|_| at("must be a number"))?
                }
                ("verify", "warn_tolerance") => {
                    config.verify.tolerances.warn_below =
                        value.parse().map_err(|_| at("must be a number"))?
                }
                ("verify", "keep_artifacts") => {
                    config.verify.keep_artifacts =
                        value.parse().map_err(|_| at("must be true or false"))?
                }
                ("verify", "work_dir") => {
                    config.verify.work_dir = Some(root_dir.join(value.trim_matches('"')))
                }
                _ => debug!(section = %section, key, "ignoring unknown configuration key"),
            }
        }

        let t = config.verify.tolerances;
        if !(t.match_below > 0.0 && t.match_below <= t.warn_below && t.warn_below.is_finite()) {
            return Err(format!(
                "tolerances must satisfy 0 < match_tolerance <= warn_tolerance (got {} and {})",
                t.match_below, t.warn_below
            ));
        }
        if config.build.compiler.is_empty() {
            return Err("`build.cc` must not be empty".to_string());
        }
        Ok(config)
    }

    /// Try to find a modelc.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Configuration for a run started in `start_dir`: the nearest
    /// modelc.toml if there is one, defaults otherwise, then the environment.
    pub fn discover(start_dir: &Path) -> Result<Config> {
        let config = match Self::find(start_dir) {
            Some(path) => Self::load(&path)?,
            None => Config::default(),
        };
        Ok(config.with_env())
    }

    /// Apply `CC` from the environment.
    pub fn with_env(mut self) -> Self {
        if let Ok(cc) = std::env::var("CC") {
            if !cc.trim().is_empty() {
                self.build.compiler = cc.trim().to_string();
            }
        }
        self
    }

    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            tolerances: self.verify.tolerances,
            keep_artifacts: self.verify.keep_artifacts,
            work_dir: self.verify.work_dir.clone(),
        }
    }
}

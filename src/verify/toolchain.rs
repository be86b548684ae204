//! C toolchain access.
//!
//! The harness only needs two things from a toolchain: turn a driver file
//! into an executable, and run that executable for its stdout. Both sit
//! behind `Toolchain` so tests can substitute a canned implementation.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::BuildConfig;
use crate::error::{Error, Result};

pub trait Toolchain: Send + Sync {
    /// Compile `driver` into the executable `output`.
    fn build(&self, driver: &Path, output: &Path) -> Result<()>;
    /// Run `binary` and return everything it printed to stdout.
    fn execute(&self, binary: &Path) -> Result<String>;
}

/// A system C compiler invoked as `cc [flags] driver.c -o out [libs]`.
#[derive(Clone, Debug)]
pub struct CcToolchain {
    pub compiler: String,
    pub flags: Vec<String>,
    pub libs: Vec<String>,
    /// Wall-clock limit for one run of the built binary.
    pub timeout: Duration,
}

impl Default for CcToolchain {
    fn default() -> Self {
        Self::new("cc")
    }
}

impl CcToolchain {
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            flags: vec!["-O2".to_string(), "-std=c99".to_string()],
            libs: vec!["-lm".to_string()],
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(build: &BuildConfig) -> Self {
        Self {
            compiler: build.compiler.clone(),
            flags: build.flags.clone(),
            libs: build.libs.clone(),
            timeout: Duration::from_secs(build.timeout_secs),
        }
    }

    /// Whether the compiler can be spawned at all.
    pub fn available(&self) -> bool {
        Command::new(&self.compiler)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn command_line(&self, driver: &Path, output: &Path) -> Vec<String> {
        let mut args = self.flags.clone();
        args.push(driver.to_string_lossy().to_string());
        args.push("-o".to_string());
        args.push(output.to_string_lossy().to_string());
        args.extend(self.libs.iter().cloned());
        args
    }
}

impl Toolchain for CcToolchain {
    fn build(&self, driver: &Path, output: &Path) -> Result<()> {
        let args = self.command_line(driver, output);
        let command = format!("{} {}", self.compiler, args.join(" "));
        debug!(%command, "compiling driver");
        let result = Command::new(&self.compiler)
            .args(&args)
            .output()
            .map_err(|e| Error::BuildFailure {
                command: command.clone(),
                stderr: format!("failed to spawn {}: {}", self.compiler, e),
            })?;
        if !result.status.success() {
            return Err(Error::BuildFailure {
                command,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn execute(&self, binary: &Path) -> Result<String> {
        // Output goes to files so a chatty binary cannot fill a pipe and
        // stall while we poll.
        let stdout_path = with_suffix(binary, "stdout");
        let stderr_path = with_suffix(binary, "stderr");
        let stdout = File::create(&stdout_path).map_err(|e| Error::io(&stdout_path, e))?;
        let stderr = File::create(&stderr_path).map_err(|e| Error::io(&stderr_path, e))?;

        let start = Instant::now();
        let mut child = Command::new(binary)
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| Error::ExecuteFailure {
                reason: format!("failed to spawn {}: {}", binary.display(), e),
                stderr: String::new(),
            })?;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!(binary = %binary.display(), "driver timed out");
                        return Err(Error::ExecuteFailure {
                            reason: format!("timed out after {:?}", self.timeout),
                            stderr: read_lossy(&stderr_path),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    return Err(Error::ExecuteFailure {
                        reason: format!("wait error: {}", e),
                        stderr: String::new(),
                    })
                }
            }
        };
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "driver finished");

        if !status.success() {
            return Err(Error::ExecuteFailure {
                reason: format!("driver exited with {}", status),
                stderr: read_lossy(&stderr_path),
            });
        }
        std::fs::read_to_string(&stdout_path).map_err(|e| Error::io(&stdout_path, e))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn read_lossy(path: &Path) -> String {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_order() {
        let cc = CcToolchain::new("gcc");
        let args = cc.command_line(Path::new("/w/driver.c"), Path::new("/w/driver"));
        assert_eq!(args, vec!["-O2", "-std=c99", "/w/driver.c", "-o", "/w/driver", "-lm"]);
    }

    #[test]
    fn test_from_config() {
        let build = BuildConfig {
            compiler: "clang".to_string(),
            flags: vec!["-O0".to_string()],
            libs: vec![],
            timeout_secs: 5,
        };
        let cc = CcToolchain::from_config(&build);
        assert_eq!(cc.compiler, "clang");
        assert_eq!(cc.flags, vec!["-O0"]);
        assert!(cc.libs.is_empty());
        assert_eq!(cc.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_compiler_is_build_failure() {
        let cc = CcToolchain::new("modelc-no-such-compiler");
        assert!(!cc.available());
        let dir = tempfile::tempdir().unwrap();
        let err = cc
            .build(&dir.path().join("driver.c"), &dir.path().join("driver"))
            .unwrap_err();
        match err {
            Error::BuildFailure { command, stderr } => {
                assert!(command.starts_with("modelc-no-such-compiler "));
                assert!(stderr.contains("failed to spawn"));
            }
            other => panic!("expected BuildFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_binary_is_execute_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = CcToolchain::default()
            .execute(&dir.path().join("driver"))
            .unwrap_err();
        assert!(matches!(err, Error::ExecuteFailure { .. }));
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("/tmp/driver"), "stdout"),
            PathBuf::from("/tmp/driver.stdout")
        );
    }
}

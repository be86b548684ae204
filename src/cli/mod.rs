pub mod hash;
pub mod inspect;
pub mod transpile;
pub mod verify;

use std::path::Path;
use std::process;

use modelc::{Config, GeneratedSource, ModelArtifact};

/// Load an artifact, rendering lint warnings. Exits on error.
pub fn load_artifact(path: &Path) -> ModelArtifact {
    let artifact = match ModelArtifact::load(path) {
        Ok(a) => a,
        Err(e) => {
            e.render();
            process::exit(1);
        }
    };
    if let Ok(source) = std::fs::read_to_string(path) {
        let name = path.to_string_lossy();
        for warning in artifact.lint(&source) {
            warning.render(&name, &source);
        }
    }
    artifact
}

/// Load an artifact and generate its source. Exits on error.
pub fn load_and_generate(path: &Path) -> (ModelArtifact, GeneratedSource) {
    let artifact = load_artifact(path);
    match modelc::transpile(&artifact) {
        Ok(source) => (artifact, source),
        Err(e) => {
            e.render();
            process::exit(1);
        }
    }
}

/// Configuration for inputs under `dir`. Exits on error.
pub fn load_config(dir: &Path) -> Config {
    match Config::discover(dir) {
        Ok(c) => c,
        Err(e) => {
            e.render();
            process::exit(1);
        }
    }
}

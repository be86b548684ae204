use std::path::{Path, PathBuf};
use std::process;

use super::load_and_generate;

pub fn cmd_transpile(input: PathBuf, output: Option<PathBuf>, stdout: bool) {
    let (_, source) = load_and_generate(&input);

    if stdout {
        print!("{}", source.code);
        return;
    }

    let out_path = match output {
        Some(p) if p.is_dir() => p.join(&source.file_name),
        Some(p) => p,
        None => input
            .parent()
            .unwrap_or(Path::new("."))
            .join(&source.file_name),
    };
    if let Err(e) = std::fs::write(&out_path, &source.code) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    eprintln!(
        "Generated {} ({}, {} features) -> {}",
        input.display(),
        source.family,
        source.n_features,
        out_path.display()
    );
}

use std::path::{Path, PathBuf};
use std::process;

use modelc::verify::{batch_json, load_vectors, CcToolchain};

use super::load_config;

pub fn cmd_verify(
    inputs: Vec<PathBuf>,
    vectors_path: Option<PathBuf>,
    json: bool,
    keep: bool,
    cc: Option<String>,
) {
    let start_dir = inputs
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut config = load_config(start_dir);
    if let Some(cc) = cc {
        config.build.compiler = cc;
    }
    let mut options = config.verify_options();
    options.keep_artifacts |= keep;

    let toolchain = CcToolchain::from_config(&config.build);
    if !toolchain.available() {
        eprintln!(
            "error: C compiler '{}' not found (set CC, --cc, or build.cc in modelc.toml)",
            toolchain.compiler
        );
        process::exit(1);
    }

    let vectors = match vectors_path.as_deref().map(load_vectors).transpose() {
        Ok(v) => v,
        Err(e) => {
            e.render();
            process::exit(1);
        }
    };

    eprintln!("Verifying {} model(s) with {}...", inputs.len(), toolchain.compiler);
    let results = modelc::verify_many(&inputs, vectors.as_deref(), &toolchain, &options);

    let mut failed = 0;
    for (path, result) in inputs.iter().zip(&results) {
        match result {
            Ok(report) => {
                if !report.passed() {
                    failed += 1;
                }
                if !json {
                    println!("{}", report.format_report());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}:", path.display());
                e.render();
            }
        }
    }
    if json {
        println!("{}", batch_json(&inputs, &results));
    }

    if failed > 0 {
        eprintln!("{} of {} model(s) failed verification", failed, inputs.len());
        process::exit(1);
    }
    eprintln!("All {} model(s) verified", inputs.len());
}

use std::path::PathBuf;
use std::process;

use modelc::ReferenceModel;

use super::load_artifact;

pub fn cmd_inspect(input: PathBuf) {
    let artifact = load_artifact(&input);
    let descriptor = match modelc::extract(&artifact) {
        Ok(d) => d,
        Err(e) => {
            e.render();
            process::exit(1);
        }
    };
    match descriptor.summary() {
        Ok(summary) => {
            println!("{}", input.display());
            print!("{}", summary);
            println!("  Input width: {}", artifact.n_features());
            if !artifact.test_vectors.is_empty() {
                println!("  Bundled test vectors: {}", artifact.test_vectors.len());
            }
        }
        Err(e) => {
            e.render();
            process::exit(1);
        }
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(
    name = "modelc",
    version,
    about = "Compile trained ML models to standalone C and verify the result"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate C source from a model artifact
    Transpile {
        /// Model artifact (.json)
        input: PathBuf,
        /// Output .c file, or a directory to write the conventional name into
        /// (default: <family>_model.c next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the source to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Compile the generated source and compare it with the model
    Verify {
        /// Model artifacts (.json)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// JSON file with test vectors (array of number arrays)
        #[arg(long, value_name = "PATH")]
        vectors: Option<PathBuf>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
        /// Keep the generated source, driver and binary
        #[arg(long)]
        keep: bool,
        /// C compiler (overrides modelc.toml and CC)
        #[arg(long, value_name = "CC")]
        cc: Option<String>,
    },
    /// Show the BLAKE3 hash of the generated source
    Hash {
        /// Model artifact (.json)
        input: PathBuf,
        /// Show the full 256-bit hash instead of the short form
        #[arg(long)]
        full: bool,
    },
    /// Summarize a model artifact without generating code
    Inspect {
        /// Model artifact (.json)
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("modelc=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Transpile {
            input,
            output,
            stdout,
        } => cli::transpile::cmd_transpile(input, output, stdout),
        Command::Verify {
            inputs,
            vectors,
            json,
            keep,
            cc,
        } => cli::verify::cmd_verify(inputs, vectors, json, keep, cc),
        Command::Hash { input, full } => cli::hash::cmd_hash(input, full),
        Command::Inspect { input } => cli::inspect::cmd_inspect(input),
    }
}

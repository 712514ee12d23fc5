use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use snapcraft_validator::{
    DEFAULT_MANIFEST_PATH, load_config_path, render_load_error, render_report, validate_manifest,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate snapcraft.yaml without snapcraft installed", long_about = None)]
struct Cli {
    /// Path to the snapcraft.yaml manifest
    #[arg(default_value = DEFAULT_MANIFEST_PATH)]
    path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (manifest, source) = match load_config_path(&cli.path) {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!(path = %cli.path.display(), error = %err, "manifest could not be loaded");
            print!("{}", render_load_error(&cli.path, &err));
            return ExitCode::FAILURE;
        }
    };

    let report = validate_manifest(&manifest, &source);
    print!("{}", render_report(&cli.path, &report));

    let passed = report.passed();
    debug!(passed, "done");
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

pub mod report;
pub mod schema;
pub mod validation;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use schema::Manifest;
use serde_yaml::{Error as YamlError, Value};
use thiserror::Error;
use tracing::debug;

pub use report::{render_load_error, render_report};
pub use validation::{Location, Note, Severity, ValidationIssue, ValidationReport, validate_manifest};

/// Path used when the CLI is invoked without an argument.
pub const DEFAULT_MANIFEST_PATH: &str = "snapcraft.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid YAML syntax: {0}")]
    Parse(#[from] YamlError),
    #[error("document does not contain a YAML mapping at the top level")]
    NotAMapping,
}

/// Parses manifest text, resolving `<<` merge keys before the document is
/// inspected.
pub fn parse_config_str(src: &str) -> Result<Manifest, ConfigError> {
    let mut value: Value = serde_yaml::from_str(src)?;
    value.apply_merge()?;
    match value {
        Value::Mapping(root) => Ok(Manifest::new(root)),
        _ => Err(ConfigError::NotAMapping),
    }
}

/// Reads and parses a manifest, returning the source text alongside it so
/// findings can be located.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<(Manifest, String), ConfigError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading manifest");
    let content = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    })?;
    let manifest = parse_config_str(&content)?;
    debug!(keys = manifest.len(), "manifest parsed");
    Ok((manifest, content))
}

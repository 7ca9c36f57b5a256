//! Configuration file support for sbom-cataloger.
//!
//! Provides YAML-based configuration through `sbom-cataloger.config.yml`
//! files, including data structures, file loading, and validation.

use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::application::dto::OutputFormat;
use crate::cataloging::domain::Scope;
use crate::shared::error::CatalogerError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "sbom-cataloger.config.yml";

/// Top-level configuration file schema.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Output format, e.g. `spdx-json`
    pub output: Option<String>,
    /// Image scope: `squashed` or `all-layers`
    pub scope: Option<String>,
    /// File to write the document to instead of stdout
    pub file: Option<PathBuf>,
    /// Names of the analyzers to run
    pub analyzers: Option<Vec<String>>,
    /// Parent directory for extracted image workspaces
    pub work_dir: Option<PathBuf>,
    /// Largest file, in bytes, an analyzer may read
    pub max_file_size: Option<u64>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: BTreeMap<String, serde_yaml_ng::Value>,
}

impl ConfigFile {
    /// The configured output format, if any
    pub fn output_format(&self) -> Result<Option<OutputFormat>> {
        self.output
            .as_deref()
            .map(|value| OutputFormat::from_str(value).map_err(|e| invalid("output", e)))
            .transpose()
            .map_err(Into::into)
    }

    /// The configured scope, if any
    pub fn scope(&self) -> Result<Option<Scope>> {
        self.scope
            .as_deref()
            .map(|value| Scope::from_str(value).map_err(|e| invalid("scope", e)))
            .transpose()
            .map_err(Into::into)
    }
}

fn invalid(field: &str, message: String) -> CatalogerError {
    CatalogerError::InvalidConfig {
        message: format!("{}: {}", field, message),
        hint: format!("Fix or remove the '{}' field in the config file.", field),
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(path, &config);

    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    config.output_format()?;
    config.scope()?;

    if let Some(ref analyzers) = config.analyzers {
        for (i, name) in analyzers.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(CatalogerError::InvalidConfig {
                    message: format!("analyzers[{}] must not be empty", i),
                    hint: "List analyzer names such as \"python\" or \"dpkg\".".to_string(),
                }
                .into());
            }
        }
    }

    if config.max_file_size == Some(0) {
        return Err(CatalogerError::InvalidConfig {
            message: "max_file_size must be greater than zero".to_string(),
            hint: "Omit the field to use the default limit of 100 MiB.".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(path: &Path, config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        tracing::warn!(
            path = %path.display(),
            field = %key,
            "unknown config field will be ignored"
        );
    }
}

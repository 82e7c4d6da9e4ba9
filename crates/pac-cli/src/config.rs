//! # Configuration
//!
//! Settings come from three layers, highest priority first: command-line
//! flags, an optional YAML file given with `--config`, and built-in
//! defaults. Relative paths resolve against the connector root, except
//! `root` itself in a config file, which resolves against the file's
//! directory.
//!
//! ```yaml
//! root: ..
//! openapi: src/declarative/openapi/openapi.yaml
//! strict_schemas: true
//! manifest_schema: ci/manifest.schema.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::runner::ValidateArgs;
use crate::{locate_connector_root, resolve_path, MANIFEST_PATH, OPENAPI_PATH, SCHEMAS_PATH};

/// Contents of a `--config` file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Connector root.
    pub root: Option<PathBuf>,
    /// OpenAPI document.
    pub openapi: Option<PathBuf>,
    /// Schema document.
    pub schemas: Option<PathBuf>,
    /// Plugin manifest.
    pub manifest: Option<PathBuf>,
    /// Compile every schema definition as a JSON Schema.
    #[serde(default)]
    pub strict_schemas: bool,
    /// JSON Schema the manifest must satisfy.
    pub manifest_schema: Option<PathBuf>,
}

impl ValidatorConfig {
    /// Parse a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        if let Some(root) = config.root.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.root = Some(resolve_path(&root, base));
        }
        Ok(config)
    }
}

/// Fully resolved settings for one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Connector root.
    pub root: PathBuf,
    /// OpenAPI document.
    pub openapi: PathBuf,
    /// Schema document.
    pub schemas: PathBuf,
    /// Plugin manifest.
    pub manifest: PathBuf,
    /// Compile every schema definition as a JSON Schema.
    pub strict_schemas: bool,
    /// JSON Schema the manifest must satisfy.
    pub manifest_schema: Option<PathBuf>,
}

impl RunnerConfig {
    /// Default document locations under `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            openapi: root.join(OPENAPI_PATH),
            schemas: root.join(SCHEMAS_PATH),
            manifest: root.join(MANIFEST_PATH),
            strict_schemas: false,
            manifest_schema: None,
            root,
        }
    }

    /// Build the configuration from command-line arguments, loading the
    /// config file and locating the connector root as needed.
    pub fn from_args(args: &ValidateArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ValidatorConfig::load(path)?,
            None => ValidatorConfig::default(),
        };

        let root = match args.root.as_ref().or(file.root.as_ref()) {
            Some(root) => root.clone(),
            None => locate_connector_root(),
        };

        let config = Self::merge(root, args, &file);
        tracing::debug!(
            root = %config.root.display(),
            openapi = %config.openapi.display(),
            schemas = %config.schemas.display(),
            manifest = %config.manifest.display(),
            strict_schemas = config.strict_schemas,
            "resolved validation targets"
        );
        Ok(config)
    }

    /// Layer flags over the config file over defaults for a known root.
    pub fn merge(root: PathBuf, args: &ValidateArgs, file: &ValidatorConfig) -> Self {
        let pick = |flag: &Option<PathBuf>, from_file: &Option<PathBuf>, default: &str| {
            let chosen = flag
                .as_deref()
                .or(from_file.as_deref())
                .unwrap_or_else(|| Path::new(default));
            resolve_path(chosen, &root)
        };

        Self {
            openapi: pick(&args.openapi, &file.openapi, OPENAPI_PATH),
            schemas: pick(&args.schemas, &file.schemas, SCHEMAS_PATH),
            manifest: pick(&args.manifest, &file.manifest, MANIFEST_PATH),
            strict_schemas: args.strict_schemas || file.strict_schemas,
            manifest_schema: args
                .manifest_schema
                .as_ref()
                .or(file.manifest_schema.as_ref())
                .map(|p| resolve_path(p, &root)),
            root,
        }
    }
}

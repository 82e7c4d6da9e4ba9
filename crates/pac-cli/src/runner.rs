//! # Validation Runner
//!
//! Runs the three connector checks and turns their results into an exit
//! code:
//!
//! 1. [`validate_openapi`] — the OpenAPI specification, through an
//!    [`OpenApiValidator`].
//! 2. [`validate_schema`] — the schema document declares `Flow` and
//!    `FlowRun`.
//! 3. [`validate_manifest`] — the plugin manifest carries its required
//!    properties and at least one action.
//!
//! Checks are independent. A check that cannot read or parse its document
//! reports the error and counts as failed; the other checks still run.
//! Success lines go to stdout, failure lines to stderr.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use pac_schema::{
    check_manifest, check_schema_document, compile_schema_entries, load_document,
    JsonSchemaValidator, OpenApiValidator, StructuralValidator,
};

use crate::config::RunnerConfig;

/// Exit code when every check passed.
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code when a check failed or validation could not run.
pub const EXIT_FAILURE: u8 = 1;

/// Arguments for `pac-validate`. With none given, the three default
/// documents of the connector containing the current directory are checked.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// YAML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Connector root (the directory containing src/declarative/).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// OpenAPI document to validate.
    #[arg(long, value_name = "PATH")]
    pub openapi: Option<PathBuf>,

    /// Schema document to validate.
    #[arg(long, value_name = "PATH")]
    pub schemas: Option<PathBuf>,

    /// Plugin manifest to validate.
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Also compile every schema definition as a JSON Schema.
    #[arg(long)]
    pub strict_schemas: bool,

    /// Also validate the manifest against this JSON Schema.
    #[arg(long, value_name = "PATH")]
    pub manifest_schema: Option<PathBuf>,
}

/// Where check results are written.
pub struct Console<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    /// Write progress and success lines to `out`, failures to `err`.
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }

    fn line(&mut self, text: impl fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    fn error(&mut self, text: impl fmt::Display) -> io::Result<()> {
        writeln!(self.err, "{text}")
    }
}

/// Validate the OpenAPI specification at `path`.
pub fn validate_openapi(
    console: &mut Console<'_>,
    validator: &dyn OpenApiValidator,
    path: &Path,
) -> io::Result<bool> {
    tracing::info!(path = %path.display(), "validating OpenAPI specification");
    console.line("Validating OpenAPI specification...")?;

    match validator.validate(path) {
        Ok(summary) => {
            tracing::debug!(
                openapi = %summary.openapi_version,
                paths = summary.path_count,
                operations = summary.operation_count,
                "OpenAPI specification accepted"
            );
            console.line("✅ OpenAPI specification is valid")?;
            console.line(format!("API name: {}", summary.title))?;
            console.line(format!("Version: {}", summary.version))?;
            Ok(true)
        }
        Err(e) => {
            console.error("❌ OpenAPI validation failed:")?;
            console.error(e)?;
            Ok(false)
        }
    }
}

/// Validate the schema document at `path`. With `strict`, every schema
/// definition must also compile as a JSON Schema.
pub fn validate_schema(console: &mut Console<'_>, path: &Path, strict: bool) -> io::Result<bool> {
    tracing::info!(path = %path.display(), strict, "validating schema definitions");
    console.line("Validating schema definitions...")?;

    let doc = match load_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            console.error("❌ Schema validation failed:")?;
            console.error(e)?;
            return Ok(false);
        }
    };

    if let Err(violation) = check_schema_document(&doc) {
        console.error(format!("❌ Schema validation failed: {violation}"))?;
        return Ok(false);
    }

    if strict {
        match compile_schema_entries(&doc) {
            Ok(count) => tracing::debug!(count, "schema definitions compiled"),
            Err(e) => {
                console.error("❌ Schema validation failed:")?;
                console.error(e)?;
                return Ok(false);
            }
        }
    }

    console.line("✅ Schema definitions are valid")?;
    Ok(true)
}

/// Validate the plugin manifest at `path`, and against `manifest_schema`
/// when one is given.
pub fn validate_manifest(
    console: &mut Console<'_>,
    path: &Path,
    manifest_schema: Option<&Path>,
) -> io::Result<bool> {
    tracing::info!(path = %path.display(), "validating plugin manifest");
    console.line("Validating plugin manifest...")?;

    let doc = match load_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            console.error("❌ Manifest validation failed:")?;
            console.error(e)?;
            return Ok(false);
        }
    };

    if let Err(violation) = check_manifest(&doc) {
        console.error(format!("❌ Manifest validation failed: {violation}"))?;
        return Ok(false);
    }

    if let Some(schema_path) = manifest_schema {
        let checked = JsonSchemaValidator::from_file(schema_path)
            .and_then(|validator| validator.validate(&doc));
        if let Err(e) = checked {
            console.error("❌ Manifest validation failed:")?;
            console.error(e)?;
            return Ok(false);
        }
    }

    console.line("✅ Plugin manifest is valid")?;
    Ok(true)
}

/// Run all checks with the built-in OpenAPI validator on stdout/stderr.
pub fn run_validation(config: &RunnerConfig) -> Result<u8> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut console = Console::new(&mut out, &mut err);
    run_with(config, &StructuralValidator::new(), &mut console)
}

/// Run all checks and return the exit code.
pub fn run_with(
    config: &RunnerConfig,
    validator: &dyn OpenApiValidator,
    console: &mut Console<'_>,
) -> Result<u8> {
    // A failed console write (stdout closed early) ends the run here; the
    // remaining checks are skipped and `exit_code` turns the error into 1.
    console.line("Starting validation of Power Automate Connector...")?;

    let openapi_valid = validate_openapi(console, validator, &config.openapi)?;
    let schema_valid = validate_schema(console, &config.schemas, config.strict_schemas)?;
    let manifest_valid =
        validate_manifest(console, &config.manifest, config.manifest_schema.as_deref())?;

    tracing::info!(
        openapi = openapi_valid,
        schemas = schema_valid,
        manifest = manifest_valid,
        "validation finished"
    );

    if openapi_valid && schema_valid && manifest_valid {
        console.line("✅ All validations passed!")?;
        Ok(EXIT_SUCCESS)
    } else {
        console.error("❌ Validation failed. Please fix the issues and try again.")?;
        Ok(EXIT_FAILURE)
    }
}

/// Exit code for the outcome of a run. An error that escaped the checks is
/// logged and counts as a failure.
pub fn exit_code(result: Result<u8>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Unexpected error during validation: {e:#}");
            EXIT_FAILURE
        }
    }
}

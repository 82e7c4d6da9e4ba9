//! # pac-cli — Connector Validation CLI
//!
//! Provides the `pac-validate` binary, which checks the declarative
//! artifacts of a Power Automate connector before it is packaged:
//!
//! ```bash
//! pac-validate                      # validate the connector containing the CWD
//! pac-validate --root ../connector  # validate another connector
//! pac-validate --strict-schemas -v  # also compile every schema definition
//! ```
//!
//! Exit code `0` means all three checks passed; `1` means at least one
//! failed or validation could not run.
//!
//! ## Layout
//!
//! A connector root contains:
//!
//! - `src/declarative/openapi/openapi.json`
//! - `src/declarative/schemas/schemas.json`
//! - `src/declarative/manifest.json`

pub mod config;
pub mod runner;

use std::path::{Path, PathBuf};

/// Directory whose presence marks a connector root.
pub const DECLARATIVE_DIR: &str = "src/declarative";

/// Default OpenAPI document, relative to the connector root.
pub const OPENAPI_PATH: &str = "src/declarative/openapi/openapi.json";

/// Default schema document, relative to the connector root.
pub const SCHEMAS_PATH: &str = "src/declarative/schemas/schemas.json";

/// Default plugin manifest, relative to the connector root.
pub const MANIFEST_PATH: &str = "src/declarative/manifest.json";

/// Resolve `path` against the connector root unless it is absolute.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Walk up from `start` to the first directory containing `src/declarative/`.
pub fn find_connector_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(DECLARATIVE_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Pick the connector root when none was configured.
///
/// Searches upward from the current directory, then from the directory of
/// the running executable, and falls back to the current directory.
pub fn locate_connector_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if let Some(root) = find_connector_root(&cwd) {
        return root;
    }

    let from_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(find_connector_root));
    if let Some(root) = from_exe {
        tracing::debug!(root = %root.display(), "connector root found from executable location");
        return root;
    }

    tracing::warn!(
        cwd = %cwd.display(),
        "no {DECLARATIVE_DIR}/ directory found; using current directory as connector root"
    );
    cwd
}

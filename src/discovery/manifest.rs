//! package.json reading

use crate::core::error::PublishError;
use serde::Deserialize;
use std::path::Path;

/// Manifest file every target directory must contain
pub const MANIFEST_FILE: &str = "package.json";

/// The subset of package.json this tool reads
#[derive(Debug, Deserialize)]
struct PackageJson {
    name: Option<String>,
}

/// Read the module name from `dir/package.json`
///
/// Missing files, invalid JSON and a missing or empty `name` are all
/// `ManifestRead` errors.
pub fn read_module_name(dir: &Path) -> Result<String, PublishError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_error = |message: String| PublishError::ManifestRead {
        path: manifest_path.clone(),
        message,
    };

    let content = std::fs::read_to_string(&manifest_path).map_err(|e| manifest_error(e.to_string()))?;
    let pkg: PackageJson =
        serde_json::from_str(&content).map_err(|e| manifest_error(e.to_string()))?;

    match pkg.name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(manifest_error("missing \"name\" field".to_string())),
    }
}

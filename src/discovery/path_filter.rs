//! Eligibility of candidate paths
//!
//! Ignore entries match by plain substring containment on the path as
//! written, not by glob or path segment: ignoring `test` also excludes
//! `packages/latest`. This is kept as-is for compatibility with existing
//! configurations. Where the project lives on disk never takes part in
//! the match.

use crate::core::config::PublishOptions;
use crate::discovery::Candidate;
use crate::discovery::manifest::MANIFEST_FILE;
use std::path::Path;

/// First ignore entry contained in `path`, if any
pub fn ignored_by<'a>(path: &Path, ignore: &'a [String]) -> Option<&'a str> {
    let path = path.to_string_lossy();
    ignore
        .iter()
        .find(|pattern| path.contains(pattern.as_str()))
        .map(String::as_str)
}

/// Whether `path` is a directory that holds a manifest
pub fn has_manifest(path: &Path) -> bool {
    path.is_dir() && path.join(MANIFEST_FILE).is_file()
}

/// Whether `candidate` should be published
pub fn is_eligible(candidate: &Candidate, options: &PublishOptions) -> bool {
    ignored_by(candidate.source(), &options.ignore).is_none() && has_manifest(candidate.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn options_with_ignore(ignore: &[&str]) -> PublishOptions {
        PublishOptions {
            ignore: ignore.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn package_dir(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), r#"{"name": "x"}"#).unwrap();
        dir
    }

    #[test]
    fn test_ignored_by_first_match_wins() {
        let ignore = vec!["node_modules".to_string(), "modules".to_string()];
        let path = Path::new("repo/node_modules/pkg");
        assert_eq!(ignored_by(path, &ignore), Some("node_modules"));
    }

    #[test]
    fn test_ignored_by_is_substring_not_segment() {
        let ignore = vec!["test".to_string()];
        assert_eq!(ignored_by(Path::new("packages/latest"), &ignore), Some("test"));
        assert_eq!(ignored_by(Path::new("packages/stable"), &ignore), None);
    }

    #[test]
    fn test_eligible_package_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = package_dir(temp_dir.path(), "pkg-a");
        assert!(is_eligible(&Candidate::new(dir, "pkg-a"), &PublishOptions::default()));
    }

    #[test]
    fn test_ignored_package_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = package_dir(temp_dir.path(), "node_modules/dep");
        assert!(has_manifest(&dir));
        assert!(!is_eligible(
            &Candidate::new(dir, "node_modules/dep"),
            &PublishOptions::default()
        ));
    }

    #[test]
    fn test_location_on_disk_is_not_matched() {
        let temp_dir = TempDir::new().unwrap();
        let dir = package_dir(temp_dir.path(), "contest-entries/packages/pkg-a");

        let candidate = Candidate::new(dir, "packages/pkg-a");

        assert!(is_eligible(&candidate, &options_with_ignore(&["test"])));
    }

    #[test]
    fn test_empty_ignore_list() {
        let temp_dir = TempDir::new().unwrap();
        let dir = package_dir(temp_dir.path(), "node_modules/dep");
        assert!(is_eligible(
            &Candidate::new(dir, "node_modules/dep"),
            &options_with_ignore(&[])
        ));
    }

    #[test]
    fn test_directory_without_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("empty");
        std::fs::create_dir(&dir).unwrap();
        assert!(!is_eligible(&Candidate::from(dir), &PublishOptions::default()));
    }

    #[test]
    fn test_file_is_not_eligible() {
        let temp_dir = TempDir::new().unwrap();
        let dir = package_dir(temp_dir.path(), "pkg");
        assert!(!is_eligible(
            &Candidate::from(dir.join(MANIFEST_FILE)),
            &PublishOptions::default()
        ));
    }

    #[test]
    fn test_manifest_directory_is_not_a_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("odd");
        std::fs::create_dir_all(dir.join(MANIFEST_FILE)).unwrap();
        assert!(!has_manifest(&dir));
    }

    #[test]
    fn test_nonexistent_path() {
        assert!(!has_manifest(Path::new("/nonexistent/batch-publish/pkg")));
    }
}

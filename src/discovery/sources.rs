//! Expansion of configured sources into candidates

use crate::core::error::PublishError;
use crate::discovery::Candidate;
use crate::discovery::path_filter::ignored_by;
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn is_glob(source: &str) -> bool {
    source.contains(['*', '?', '['])
}

/// Glob pattern for `source`, with `base_dir` matched literally
fn glob_pattern(source: &str, base_dir: &Path) -> String {
    if Path::new(source).is_absolute() {
        return source.to_string();
    }
    let base = Pattern::escape(&base_dir.to_string_lossy());
    Path::new(&base).join(source).to_string_lossy().into_owned()
}

/// `path` relative to `base`, or unchanged when it lies elsewhere
fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Expand sources into an ordered, de-duplicated list of candidates
///
/// Glob patterns are expanded in the order the `glob` crate yields them;
/// literal paths are passed through even if they do not exist so that the
/// path filter can reject them. Relative sources resolve against
/// `base_dir`, and each candidate remembers its path relative to it.
pub fn collect_candidates(sources: &[String], base_dir: &Path) -> Result<Vec<Candidate>, PublishError> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for source in sources {
        if is_glob(source) {
            let paths = glob::glob(&glob_pattern(source, base_dir)).map_err(|e| {
                PublishError::Config(format!("Invalid source pattern {}: {}", source, e))
            })?;

            for entry in paths {
                match entry {
                    Ok(path) => {
                        let written = relative_to(&path, base_dir);
                        push_unique(&mut candidates, &mut seen, Candidate::new(path, written));
                    }
                    Err(e) => tracing::warn!("Skipping unreadable path {}", e.path().display()),
                }
            }
        } else {
            push_unique(
                &mut candidates,
                &mut seen,
                Candidate::new(base_dir.join(source), source),
            );
        }
    }

    Ok(candidates)
}

/// Walk `root` (relative to `base_dir`) and yield every directory below it,
/// root included
///
/// Subtrees whose path, written as `root` followed by the path below it,
/// contains an ignore entry are pruned rather than walked.
pub fn discover_candidates(
    root: &str,
    base_dir: &Path,
    ignore: &[String],
    max_depth: Option<usize>,
) -> Vec<Candidate> {
    let resolved_root = base_dir.join(root);
    let written = |path: &Path| Path::new(root).join(relative_to(path, &resolved_root));

    let mut walker = WalkDir::new(&resolved_root)
        .follow_links(false)
        .sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    walker
        .into_iter()
        .filter_entry(|entry| ignored_by(&written(entry.path()), ignore).is_none())
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| {
            let source = written(entry.path());
            Candidate::new(entry.into_path(), source)
        })
        .collect()
}

fn push_unique(candidates: &mut Vec<Candidate>, seen: &mut HashSet<PathBuf>, candidate: Candidate) {
    if seen.insert(candidate.path().to_path_buf()) {
        candidates.push(candidate);
    }
}

//! Discovery Module
//!
//! Resolves the `source` entries of a build configuration into concrete
//! variable documents. An entry is a file, a directory (every `.json` file
//! below it) or a glob using `*`, `**` and `?`.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, TokenError};

/// Resolve `patterns` against `base_dir`. Results keep pattern order, are
/// sorted by path within a pattern and contain each file once.
pub fn discover_sources(base_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let found = if has_wildcard(pattern) {
            find_matching(base_dir, pattern)?
        } else {
            find_literal(base_dir, pattern)?
        };

        if found.is_empty() {
            tracing::warn!(pattern = %pattern, "source pattern matched no files");
        }
        for file in found {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    Ok(files)
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

fn find_literal(base_dir: &Path, entry: &str) -> Result<Vec<PathBuf>> {
    let path = base_dir.join(entry);
    if path.is_file() {
        return Ok(vec![path]);
    }
    if path.is_dir() {
        return Ok(walk_json_files(&path)
            .into_iter()
            .filter(|p| is_json(p))
            .collect());
    }
    Err(TokenError::io(
        path,
        std::io::Error::new(std::io::ErrorKind::NotFound, "source does not exist"),
    ))
}

fn find_matching(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = pattern.trim_start_matches("./");
    let base = glob::Pattern::escape(&base_dir.to_string_lossy());
    let full_pattern = Path::new(&base).join(pattern).to_string_lossy().to_string();

    let entries = glob::glob(&full_pattern)
        .map_err(|e| TokenError::Config(format!("invalid source glob '{}': {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable entry during discovery"),
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively list files below `dir`, sorted by name.
fn walk_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping unreadable entry during discovery"),
        }
    }

    files
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    fn relative(root: &Path, found: &[PathBuf]) -> Vec<String> {
        found
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect()
    }

    #[test]
    fn test_glob_wildcards() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "tokens/a.json");
        touch(dir.path(), "tokens/a.css");
        touch(dir.path(), "tokens/deep/er/b.json");
        touch(dir.path(), "other/c.json");
        touch(dir.path(), "v1.json");
        touch(dir.path(), "v10.json");

        let found = discover_sources(dir.path(), &["tokens/**/*.json".to_string()]).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["tokens/a.json", "tokens/deep/er/b.json"]);

        let found = discover_sources(dir.path(), &["tokens/*.json".to_string()]).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["tokens/a.json"]);

        let found = discover_sources(dir.path(), &["./v?.json".to_string()]).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["v1.json"]);
    }

    #[test]
    fn test_glob_skips_matching_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "tokens/colors.json/inner.json");
        touch(dir.path(), "tokens/size.json");

        let found = discover_sources(dir.path(), &["tokens/*.json".to_string()]).unwrap();
        assert_eq!(relative(dir.path(), &found), vec!["tokens/size.json"]);
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_sources(dir.path(), &["tokens/***.json".to_string()]).unwrap_err();
        assert!(matches!(err, TokenError::Config(_)));
    }

    #[test]
    fn test_discover_glob_and_literals() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "tokens/semantic.json");
        touch(dir.path(), "tokens/foundation.json");
        touch(dir.path(), "tokens/nested/size.json");
        touch(dir.path(), "tokens/readme.md");
        touch(dir.path(), "extra/typography.json");

        let found = discover_sources(
            dir.path(),
            &[
                "tokens/**/*.json".to_string(),
                "extra".to_string(),
                "tokens/semantic.json".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(
            relative(dir.path(), &found),
            vec![
                "tokens/foundation.json",
                "tokens/nested/size.json",
                "tokens/semantic.json",
                "extra/typography.json",
            ]
        );
    }

    #[test]
    fn test_missing_literal_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_sources(dir.path(), &["nope.json".to_string()]).unwrap_err();
        assert!(matches!(err, TokenError::Io { .. }));
    }

    #[test]
    fn test_glob_without_matches_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = discover_sources(dir.path(), &["missing/**/*.json".to_string()]).unwrap();
        assert!(found.is_empty());
    }
}

//! Input file expansion for the command line.
//!
//! Each `-i` argument is either a plain path, kept as given, or a glob
//! pattern such as `include/**/*.hpp`. Patterns are matched against the files
//! under their longest literal directory prefix.

use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid input pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to list files under {root}: {source}")]
    Walk {
        root: String,
        #[source]
        source: ignore::Error,
    },
}

fn is_pattern(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}

/// Directory to walk for `pattern`: every leading component without glob
/// characters
fn walk_root(pattern: &str) -> PathBuf {
    let mut root = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) if is_pattern(&part.to_string_lossy()) => break,
            other => root.push(other),
        }
    }
    if root.as_os_str().is_empty() {
        root.push(".");
    }
    root
}

/// Expand every argument into file paths, in argument order, without
/// duplicates. A pattern that matches nothing is reported and skipped.
pub fn expand_inputs(arguments: &[String]) -> Result<Vec<PathBuf>, InputError> {
    let mut files: Vec<PathBuf> = Vec::new();

    for argument in arguments {
        if !is_pattern(argument) {
            let path = PathBuf::from(argument);
            if !files.contains(&path) {
                files.push(path);
            }
            continue;
        }

        let matcher = GlobBuilder::new(argument)
            .literal_separator(true)
            .build()
            .map_err(|source| InputError::Pattern {
                pattern: argument.clone(),
                source,
            })?
            .compile_matcher();

        let root = walk_root(argument);
        let relative = root == Path::new(".") && !argument.starts_with("./");
        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut matched = 0usize;
        for entry in walker {
            let entry = entry.map_err(|source| InputError::Walk {
                root: root.display().to_string(),
                source,
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let candidate = if relative {
                path.strip_prefix(".").unwrap_or(path)
            } else {
                path
            };
            if matcher.is_match(candidate) {
                matched += 1;
                let candidate = candidate.to_path_buf();
                if !files.contains(&candidate) {
                    files.push(candidate);
                }
            }
        }

        if matched == 0 {
            warn!(pattern = %argument, "input pattern matched no files");
        } else {
            debug!(pattern = %argument, matched, "expanded input pattern");
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        for file in ["b.hpp", "a.hpp", "notes.txt", "sub/c.hpp"] {
            fs::write(dir.path().join(file), "class A {};").unwrap();
        }
        dir
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_plain_paths_are_kept_as_given() {
        let inputs = vec!["missing.hpp".to_string(), "other.hpp".to_string(), "missing.hpp".to_string()];

        assert_eq!(
            expand_inputs(&inputs).unwrap(),
            vec![PathBuf::from("missing.hpp"), PathBuf::from("other.hpp")]
        );
    }

    #[test]
    fn test_star_matches_one_directory() {
        let dir = tree();
        let pattern = format!("{}/*.hpp", dir.path().display());

        let files = expand_inputs(&[pattern]).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["a.hpp", "b.hpp"]);
    }

    #[test]
    fn test_double_star_recurses_and_skips_duplicates() {
        let dir = tree();
        let inputs = vec![
            format!("{}/a.hpp", dir.path().display()),
            format!("{}/**/*.hpp", dir.path().display()),
        ];

        let files = expand_inputs(&inputs).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["a.hpp", "b.hpp", "sub/c.hpp"]);
    }

    #[test]
    fn test_unmatched_pattern_is_skipped() {
        let dir = tree();
        let pattern = format!("{}/*.h", dir.path().display());

        assert!(expand_inputs(&[pattern]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = expand_inputs(&["src/[*.hpp".to_string()]).unwrap_err();
        assert!(matches!(err, InputError::Pattern { .. }));
    }

    #[test]
    fn test_walk_root_stops_at_first_pattern() {
        assert_eq!(walk_root("include/**/*.hpp"), PathBuf::from("include"));
        assert_eq!(walk_root("*.hpp"), PathBuf::from("."));
        assert_eq!(walk_root("/usr/include/*.h"), PathBuf::from("/usr/include"));
    }
}

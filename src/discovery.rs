//! Input file discovery.
//!
//! Turns the paths given on the command line into the sorted list of files
//! to lint. Explicit files are always taken; directories are walked for YAML
//! files; inputs with glob metacharacters are expanded.

use crate::lint::{LintConfig, LintError, LintOpResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Resolves inputs to playbook files.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    excludes: GlobSet,
    extensions: &'static [&'static str],
}

impl FileDiscovery {
    /// Build a discovery for the given configuration.
    pub fn new(config: &LintConfig) -> LintOpResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_paths {
            let glob = Glob::new(pattern).map_err(|e| {
                LintError::RuleConfig(format!("invalid exclude pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .map_err(|e| LintError::RuleConfig(format!("invalid exclude patterns: {}", e)))?;

        Ok(Self {
            excludes,
            extensions: config.extensions.allowed(),
        })
    }

    /// Resolve inputs to a sorted, deduplicated list of files.
    pub fn discover<P: AsRef<Path>>(&self, inputs: &[P]) -> LintOpResult<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for input in inputs {
            let input = input.as_ref();
            let text = input.to_string_lossy();

            if is_glob(&text) {
                let paths = glob::glob(&text).map_err(|e| {
                    LintError::RuleConfig(format!("invalid pattern '{}': {}", text, e))
                })?;
                for entry in paths {
                    match entry {
                        Ok(path) if path.is_dir() => self.walk(&path, &mut files),
                        Ok(path) if self.matches_extension(&path) && !self.is_excluded(&path) => {
                            files.insert(path);
                        }
                        Ok(path) => trace!(path = %path.display(), "Skipping glob match"),
                        Err(e) => warn!(error = %e, "Unreadable glob match"),
                    }
                }
            } else if input.is_dir() {
                self.walk(input, &mut files);
            } else {
                // Explicit files are linted whatever their extension; missing
                // ones surface as read errors.
                files.insert(input.to_path_buf());
            }
        }

        debug!(count = files.len(), "Discovered files");
        Ok(files.into_iter().collect())
    }

    fn walk(&self, root: &Path, files: &mut BTreeSet<PathBuf>) {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let path = entry.path();
                    if self.matches_extension(path) && !self.is_excluded(path) {
                        files.insert(path.to_path_buf());
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to read directory entry"),
            }
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(&e))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix("./").unwrap_or(path);
        self.excludes.is_match(relative) || self.excludes.is_match(path)
    }
}

fn is_glob(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.') && s != "." && s != "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::ExtensionPolicy;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("roles/web/tasks")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("vendor")).unwrap();
        for file in [
            "site.yml",
            "legacy.yaml",
            "README.md",
            "roles/web/tasks/main.yml",
            ".git/config.yml",
            "vendor/lib.yml",
        ] {
            fs::write(root.join(file), "- hosts: all\n").unwrap();
        }
        dir
    }

    fn names(dir: &TempDir, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_walk_directory() {
        let dir = tree();
        let discovery = FileDiscovery::new(&LintConfig::default()).unwrap();
        let files = discovery.discover(&[dir.path()]).unwrap();
        assert_eq!(
            names(&dir, &files),
            vec!["roles/web/tasks/main.yml", "site.yml", "vendor/lib.yml"]
        );
    }

    #[test]
    fn test_yaml_policy_and_excludes() {
        let dir = tree();
        let config = LintConfig {
            extensions: ExtensionPolicy::YmlYaml,
            exclude_paths: vec!["**/vendor/**".to_string()],
            ..Default::default()
        };
        let discovery = FileDiscovery::new(&config).unwrap();
        let files = discovery.discover(&[dir.path()]).unwrap();
        assert_eq!(
            names(&dir, &files),
            vec!["legacy.yaml", "roles/web/tasks/main.yml", "site.yml"]
        );
    }

    #[test]
    fn test_explicit_files_and_globs() {
        let dir = tree();
        let discovery = FileDiscovery::new(&LintConfig::default()).unwrap();
        let readme = dir.path().join("README.md");
        let pattern = dir.path().join("*.yml");
        let files = discovery
            .discover(&[readme.clone(), pattern, readme])
            .unwrap();
        assert_eq!(names(&dir, &files), vec!["README.md", "site.yml"]);
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let config = LintConfig {
            exclude_paths: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            FileDiscovery::new(&config),
            Err(LintError::RuleConfig(_))
        ));
    }
}

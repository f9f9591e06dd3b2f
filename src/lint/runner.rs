//! Parallel per-file driver.

use super::report::LintResult;
use super::types::LintError;
use super::Linter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

/// Lints many files concurrently, one blocking task per file.
///
/// Files share nothing but the immutable [`Linter`]; the merged result is
/// sorted before it is returned, so output order never depends on which
/// file finished first.
#[derive(Debug, Clone)]
pub struct LintRunner {
    linter: Arc<Linter>,
}

impl LintRunner {
    pub fn new(linter: Arc<Linter>) -> Self {
        Self { linter }
    }

    pub fn linter(&self) -> &Linter {
        &self.linter
    }

    /// Lint every file and merge the results.
    pub async fn run(&self, files: Vec<PathBuf>) -> LintResult {
        let budget = self.linter.config().timeout;
        info!(files = files.len(), timeout = ?budget, "Linting files");

        let mut set = JoinSet::new();
        for path in files {
            let linter = Arc::clone(&self.linter);
            set.spawn(async move {
                let task_path = path.clone();
                let handle = task::spawn_blocking(move || linter.lint_path(&task_path));

                let joined = match budget {
                    Some(after) => match tokio::time::timeout(after, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            warn!(path = %path.display(), ?after, "File evaluation timed out");
                            let err = LintError::Timeout {
                                path: path.clone(),
                                after,
                            };
                            return LintResult::failed(&path, &err);
                        }
                    },
                    None => handle.await,
                };

                joined.unwrap_or_else(|e| {
                    let err = LintError::Internal {
                        path: path.clone(),
                        message: format!("Task join error: {}", e),
                    };
                    LintResult::failed(&path, &err)
                })
            });
        }

        let mut result = LintResult::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(file_result) => result.merge(file_result),
                Err(e) => warn!(error = %e, "Lint task failed"),
            }
        }
        result.finalize();

        debug!(
            diagnostics = result.diagnostics.len(),
            failed = result.failed_files.len(),
            "Lint run complete"
        );
        result
    }
}

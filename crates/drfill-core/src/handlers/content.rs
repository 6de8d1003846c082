//! Patching newly added source files.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;

use super::{BatchReport, ItemOutcome, PushHandler};
use crate::error::{DrFillError, Result};
use crate::github::{FileUpdate, RepoClient};
use crate::webhook::PushEvent;

/// Source file suffixes handled by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".cpp", ".cs", ".go", ".java", ".js", ".json", ".php", ".py", ".rb", ".ts",
];

/// The line appended by [`AppendLine::default`].
pub const DEFAULT_APPENDED_LINE: &str = "\nDoctor Fill prescribes one tall, cold line of text.\n";

/// Case-insensitive set of file extensions eligible for patching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionAllowlist {
    // Lowercase, without the leading dot.
    extensions: BTreeSet<String>,
}

impl ExtensionAllowlist {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// Whether the path's extension is in the set. Dotfiles like `.bashrc`
    /// have no extension.
    pub fn allows(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for ExtensionAllowlist {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl FromStr for ExtensionAllowlist {
    type Err = DrFillError;

    /// Parses a comma-separated list such as `.py,.rs,go`.
    fn from_str(s: &str) -> Result<Self> {
        let allowlist = Self::new(s.split(','));
        if allowlist.extensions.is_empty() {
            return Err(DrFillError::Config("Extension list is empty".to_string()));
        }
        Ok(allowlist)
    }
}

impl fmt::Display for ExtensionAllowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<String> = self.extensions.iter().map(|e| format!(".{}", e)).collect();
        f.write_str(&list.join(","))
    }
}

/// A transformation applied to a file's contents.
pub trait FilePatch: Send + Sync {
    /// Returns the new contents, or `None` to leave the file alone.
    fn patch(&self, path: &str, contents: &[u8]) -> Option<Vec<u8>>;
}

/// Appends a fixed line to every file.
#[derive(Debug, Clone)]
pub struct AppendLine {
    line: String,
}

impl AppendLine {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

impl Default for AppendLine {
    fn default() -> Self {
        Self::new(DEFAULT_APPENDED_LINE)
    }
}

impl FilePatch for AppendLine {
    fn patch(&self, _path: &str, contents: &[u8]) -> Option<Vec<u8>> {
        let mut patched = Vec::with_capacity(contents.len() + self.line.len());
        patched.extend_from_slice(contents);
        patched.extend_from_slice(self.line.as_bytes());
        Some(patched)
    }
}

/// Patches every allowlisted file added by a push and commits the result.
pub struct ContentHandler {
    allowlist: ExtensionAllowlist,
    patch: Box<dyn FilePatch>,
}

impl ContentHandler {
    pub fn new(allowlist: ExtensionAllowlist, patch: impl FilePatch + 'static) -> Self {
        Self {
            allowlist,
            patch: Box::new(patch),
        }
    }

    async fn process_file(
        &self,
        client: &dyn RepoClient,
        repo: &str,
        path: &str,
        git_ref: &str,
        branch: &str,
    ) -> ItemOutcome {
        let file = match client.get_file(repo, path, git_ref).await {
            Ok(file) => file,
            Err(e) => return ItemOutcome::Failed(e),
        };

        let Some(patched) = self.patch.patch(&file.path, &file.content) else {
            return ItemOutcome::Unchanged;
        };

        let update = FileUpdate {
            path: &file.path,
            message: format!("Doctor Fill updated {}", file.path),
            content: &patched,
            sha: &file.sha,
            branch,
        };

        match client.update_file(repo, &update).await {
            Ok(()) => {
                tracing::info!("Updated {}", file.path);
                ItemOutcome::Updated
            }
            Err(e) => ItemOutcome::Failed(e),
        }
    }
}

impl Default for ContentHandler {
    fn default() -> Self {
        Self::new(ExtensionAllowlist::default(), AppendLine::default())
    }
}

#[async_trait]
impl PushHandler for ContentHandler {
    async fn handle_push(&self, client: &dyn RepoClient, event: &PushEvent) -> BatchReport {
        let mut report = BatchReport::default();

        // Only branches can be committed to; tag pushes are left alone.
        let Some(branch) = event.branch() else {
            tracing::info!("Skipping push to non-branch ref {}", event.git_ref);
            return report;
        };

        let repo = &event.repository.full_name;
        let mut seen = HashSet::new();

        for path in event.added_files() {
            if !self.allowlist.allows(path) || !seen.insert(path) {
                continue;
            }

            tracing::info!("Processing file: {}", path);
            let outcome = self
                .process_file(client, repo, path, &event.git_ref, branch)
                .await;
            report.push(path, outcome);
        }

        report
    }
}

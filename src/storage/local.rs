//! Local filesystem storage for user subscriptions.
//!
//! ## Directory Layout
//!
//! ```text
//! {users_dir}/
//! ├── alice.yaml      # user, email_address, search_query, last_run
//! └── bob.yml
//! ```
//!
//! Each file belongs to exactly one user. `last_run` is the only field this
//! module writes; every other key in the document is carried over verbatim.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Value};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::utils::time::{format_last_run, parse_last_run};

/// Directory of per-user YAML files.
#[derive(Debug, Clone)]
pub struct UserStore {
    root_dir: PathBuf,
}

impl UserStore {
    /// Create a new UserStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Directory this store reads from.
    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// List user files (`*.yaml`, `*.yml`) sorted by file name.
    pub async fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut dir = tokio::fs::read_dir(&self.root_dir).await?;
        let mut files = Vec::new();

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if is_yaml && item.file_type().await?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Load one user record.
    pub async fn load(&self, path: &Path) -> Result<UserRecord> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        UserRecord::from_yaml(path, &content)
    }

    /// Rewrite `last_run` in the record's source file.
    ///
    /// The stored value never moves backwards: if the file already holds a
    /// later timestamp than `at`, that timestamp is kept. Returns the value
    /// now on disk.
    pub async fn write_last_run(
        &self,
        record: &UserRecord,
        at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let path = record.source.as_path();
        let fail = |e: &dyn std::fmt::Display| AppError::persistence(path, e);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| fail(&e))?;
        let mut doc: Mapping = serde_yaml::from_str(&content).map_err(|e| fail(&e))?;

        let key = Value::String("last_run".into());
        let on_disk = doc
            .get(&key)
            .and_then(Value::as_str)
            .and_then(|raw| parse_last_run(raw).ok().flatten());
        let new_value = [record.last_run, on_disk, Some(at)]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(at);

        doc.insert(key, Value::String(format_last_run(&new_value)));

        let yaml = serde_yaml::to_string(&doc).map_err(|e| fail(&e))?;
        Self::write_bytes(path, yaml.as_bytes())
            .await
            .map_err(|e| fail(&e))?;

        log::debug!(
            "Wrote last_run {} to {}",
            format_last_run(&new_value),
            path.display()
        );
        Ok(new_value)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await
    }
}

//! Narrow interfaces to the services the engine does not own.
//!
//! - [`DocumentStore`] keeps document bytes; the engine only records the
//!   metadata it hands back.
//! - [`NotificationSink`] delivers messages to accounts or whole roles.
//!   Delivery is best effort: a failure is logged and never fails the
//!   operation that triggered it.
//!
//! [`FsDocumentStore`] and [`TracingNotifier`] are the default adapters.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::AccountRole;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("rejected: {0}")]
    Rejected(String),
}

/// A file to upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

/// What the store reports back for an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub name: String,
    pub size: i64,
    pub mime: String,
    pub path: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `files` under `folder_key`.
    ///
    /// May return fewer entries than `files`; the caller treats that as a
    /// failure of the whole batch.
    async fn upload(
        &self,
        files: &[DocumentUpload],
        folder_key: &str,
    ) -> Result<Vec<StoredDocument>, CollaboratorError>;

    async fn download(&self, path: &str) -> Result<Vec<u8>, CollaboratorError>;

    /// Deletes previously uploaded files. Missing paths are not an error.
    async fn remove(&self, paths: &[String]) -> Result<(), CollaboratorError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyTarget {
    Account(Uuid),
    Role(AccountRole),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub target: NotifyTarget,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub deep_link: Option<String>,
}

impl Notification {
    pub fn new(
        target: NotifyTarget,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            target,
            title: title.into(),
            message: message.into(),
            severity,
            deep_link: None,
        }
    }

    #[must_use]
    pub fn deep_link(mut self, link: impl Into<String>) -> Self {
        self.deep_link = Some(link.into());
        self
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError>;
}

/// Stores documents as files below a root directory.
///
/// Paths handed out are relative to the root (`<folder>/<uuid>-<name>`).
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, CollaboratorError> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            return Err(CollaboratorError::Rejected(format!(
                "invalid document path: {}",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn file_name_for(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    format!("{}-{}", Uuid::new_v4().simple(), cleaned)
}

fn io_error(err: std::io::Error) -> CollaboratorError {
    CollaboratorError::Unavailable(err.to_string())
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn upload(
        &self,
        files: &[DocumentUpload],
        folder_key: &str,
    ) -> Result<Vec<StoredDocument>, CollaboratorError> {
        let folder = self.resolve(folder_key)?;
        tokio::fs::create_dir_all(&folder).await.map_err(io_error)?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let file_name = file_name_for(&file.name);
            tokio::fs::write(folder.join(&file_name), &file.bytes)
                .await
                .map_err(io_error)?;
            stored.push(StoredDocument {
                name: file.name.clone(),
                size: i64::try_from(file.bytes.len()).unwrap_or(i64::MAX),
                mime: file.mime.clone(),
                path: format!("{folder_key}/{file_name}"),
            });
        }
        Ok(stored)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, CollaboratorError> {
        let full = self.resolve(path)?;
        tokio::fs::read(full).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => {
                CollaboratorError::Rejected(format!("document not found: {path}"))
            }
            _ => io_error(err),
        })
    }

    async fn remove(&self, paths: &[String]) -> Result<(), CollaboratorError> {
        for path in paths {
            let full = self.resolve(path)?;
            match tokio::fs::remove_file(full).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(io_error(err)),
            }
        }
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError> {
        let recipient = match notification.target {
            NotifyTarget::Account(id) => format!("account:{id}"),
            NotifyTarget::Role(role) => format!("role:{}", role.as_str()),
        };
        tracing::info!(
            recipient = %recipient,
            severity = ?notification.severity,
            title = %notification.title,
            link = notification.deep_link.as_deref().unwrap_or(""),
            "{}",
            notification.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("seva-docs-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn fs_store_round_trips_and_removes() {
        let root = temp_root();
        let store = FsDocumentStore::new(&root);
        let files = vec![
            DocumentUpload::new("aadhaar card.pdf", "application/pdf", b"%PDF".to_vec()),
            DocumentUpload::new("photo.jpg", "image/jpeg", vec![1, 2, 3]),
        ];

        let stored = store.upload(&files, "req-1").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].size, 4);
        assert!(stored[0].path.starts_with("req-1/"));
        assert!(!stored[0].path.contains(' '));

        let bytes = store.download(&stored[1].path).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        let paths: Vec<String> = stored.iter().map(|s| s.path.clone()).collect();
        store.remove(&paths).await.unwrap();
        store.remove(&paths).await.unwrap();
        assert!(store.download(&paths[0]).await.is_err());

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn fs_store_refuses_paths_outside_root() {
        let store = FsDocumentStore::new(temp_root());
        assert!(matches!(
            store.download("../etc/passwd").await,
            Err(CollaboratorError::Rejected(_))
        ));
        assert!(store.upload(&[], "/abs").await.is_err());
    }
}

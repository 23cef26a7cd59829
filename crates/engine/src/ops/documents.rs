use sea_orm::{QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    AccountRole, CollaboratorError, DocumentUpload, EngineError, ResultEngine, StoredDocument,
    Task, documents, tasks,
};

use super::Engine;

fn collaborator_error(err: CollaboratorError) -> EngineError {
    match err {
        CollaboratorError::Unavailable(msg) => EngineError::Unavailable(msg),
        CollaboratorError::Rejected(msg) => EngineError::Validation(msg),
    }
}

impl Engine {
    /// Uploads every file under `folder_key`, or none of them.
    ///
    /// A short result is `PartialUploadFailure`; what did get stored is
    /// removed again before returning.
    pub(super) async fn upload_all(
        &self,
        files: &[DocumentUpload],
        folder_key: &str,
    ) -> ResultEngine<Vec<StoredDocument>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let upload = tokio::time::timeout(
            self.collaborator_timeout,
            self.documents.upload(files, folder_key),
        )
        .await
        .map_err(|_| EngineError::Unavailable("document store timed out".to_string()))?;
        let stored = upload.map_err(collaborator_error)?;

        if stored.len() < files.len() {
            let uploaded = stored.len();
            self.discard_uploads(&stored).await;
            return Err(EngineError::PartialUploadFailure {
                expected: files.len(),
                uploaded,
            });
        }
        Ok(stored)
    }

    /// Best-effort cleanup of files whose database rows were never written.
    pub(super) async fn discard_uploads(&self, stored: &[StoredDocument]) {
        if stored.is_empty() {
            return;
        }
        let paths: Vec<String> = stored.iter().map(|doc| doc.path.clone()).collect();
        let removal =
            tokio::time::timeout(self.collaborator_timeout, self.documents.remove(&paths)).await;
        match removal {
            Ok(Ok(())) => tracing::info!(count = paths.len(), "rolled back uploaded documents"),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, ?paths, "could not remove orphaned documents");
            }
            Err(_) => tracing::warn!(?paths, "removing orphaned documents timed out"),
        }
    }

    /// Fetches the bytes of a stored document.
    ///
    /// Readable by admins and by the accounts involved in the owning request.
    pub async fn download_document(&self, actor_id: Uuid, path: &str) -> ResultEngine<Vec<u8>> {
        let actor = self.require_account(&self.database, actor_id).await?;
        let document = documents::Entity::find()
            .filter(documents::Column::Path.eq(path))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("document not exists".to_string()))?;

        if actor.role != AccountRole::Admin {
            let request = self.require_request(&self.database, document.request_id).await?;
            let task = tasks::Entity::find()
                .filter(tasks::Column::OriginId.eq(request.id))
                .one(&self.database)
                .await?
                .map(Task::try_from)
                .transpose()?;
            let allowed = request.requestor_id == actor.id
                || request.generated_by == Some(actor.id)
                || task.is_some_and(|task| task.involves(actor.id));
            if !allowed {
                return Err(EngineError::Forbidden(
                    "document belongs to another request".to_string(),
                ));
            }
        }

        tokio::time::timeout(self.collaborator_timeout, self.documents.download(path))
            .await
            .map_err(|_| EngineError::Unavailable("document store timed out".to_string()))?
            .map_err(collaborator_error)
    }
}

//! Mapping between the wire types and the engine types.

use api_types::{
    account::AccountRole as ApiRole, document::DocumentPayload, task::TaskStatus as ApiStatus,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use engine::{Account, AccountRole, DocumentUpload, EngineError, TaskStatus};

use crate::ServerError;

pub(crate) fn map_role(role: ApiRole) -> AccountRole {
    match role {
        ApiRole::Customer => AccountRole::Customer,
        ApiRole::Agent => AccountRole::Agent,
        ApiRole::Admin => AccountRole::Admin,
    }
}

pub(crate) fn map_status(status: ApiStatus) -> TaskStatus {
    match status {
        ApiStatus::PendingAssignment => TaskStatus::PendingAssignment,
        ApiStatus::Assigned => TaskStatus::Assigned,
        ApiStatus::Accepted => TaskStatus::Accepted,
        ApiStatus::AdditionalDocsVle => TaskStatus::AdditionalDocsVle,
        ApiStatus::AckSubmitted => TaskStatus::AckSubmitted,
        ApiStatus::AdditionalDocsDept => TaskStatus::AdditionalDocsDept,
        ApiStatus::PendingCommissionApproval => TaskStatus::PendingCommissionApproval,
        ApiStatus::CommissionApproved => TaskStatus::CommissionApproved,
        ApiStatus::CommissionRejected => TaskStatus::CommissionRejected,
    }
}

/// Decode base64 payloads into uploads. Any malformed file fails the batch.
pub(crate) fn uploads(documents: Vec<DocumentPayload>) -> Result<Vec<DocumentUpload>, ServerError> {
    documents
        .into_iter()
        .map(|doc| {
            let bytes = STANDARD.decode(doc.content_base64.as_bytes()).map_err(|err| {
                ServerError::Generic(format!("invalid base64 content in {}: {err}", doc.name))
            })?;
            Ok(DocumentUpload::new(doc.name, doc.mime, bytes))
        })
        .collect()
}

pub(crate) fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn require_admin(actor: &Account) -> Result<(), ServerError> {
    if actor.role == AccountRole::Admin {
        Ok(())
    } else {
        Err(EngineError::Forbidden("admin only".to_string()).into())
    }
}

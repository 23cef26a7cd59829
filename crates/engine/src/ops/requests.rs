//! Request originators: bookings and leads.
//!
//! Creation order matters. Documents are uploaded first, under the new
//! request's id. Then a single database transaction writes the request, its
//! documents, the derived task and the history, and charges the fee last. If
//! any step fails nothing is charged and the uploads are removed again.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AccountRole, BookingCmd, DocumentUpload, EngineError, HistoryEntry, LeadCmd, Money,
    OriginKind, RequestDetails, ResultEngine, Service, ServiceRequest, StoredDocument, Task,
    TaskStatus, TransactionKind, documents, history, requests, tasks,
    util::{normalize_phone, normalize_required_text},
};

use super::{Engine, ledger::LedgerPosting, notify, with_tx};

/// A freshly created request and the task derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRequest {
    pub request: ServiceRequest,
    pub task: Task,
}

/// What an administrative reset removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeSummary {
    pub requests: u64,
    pub tasks: u64,
    pub documents: u64,
    pub history_entries: u64,
}

impl Engine {
    /// A customer books `cmd.service_id` and pays its current fee.
    pub async fn create_booking(&self, cmd: BookingCmd) -> ResultEngine<CreatedRequest> {
        let service = self.service(&cmd.service_id).await?;
        let customer = self
            .require_role(&self.database, cmd.customer_id, AccountRole::Customer)
            .await?;

        let request = ServiceRequest {
            id: Uuid::new_v4(),
            kind: OriginKind::Booking,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            fee_minor: service.fee_minor,
            requestor_id: customer.id,
            generated_by: None,
            customer_name: Some(customer.display_name.clone()),
            customer_phone: None,
            status: TaskStatus::PendingAssignment,
            created_at: Utc::now(),
        };
        let remark = format!("Booking created by {}", customer.display_name);
        self.originate(request, &service, &cmd.documents, &remark)
            .await
    }

    /// An agent registers a request for a customer and prepays the fee.
    pub async fn create_lead(&self, cmd: LeadCmd) -> ResultEngine<CreatedRequest> {
        let customer_name = normalize_required_text(&cmd.customer_name, "customer name")?;
        let customer_phone = normalize_phone(&cmd.customer_phone)?;
        let service = self.service(&cmd.service_id).await?;
        let agent = self
            .require_role(&self.database, cmd.agent_id, AccountRole::Agent)
            .await?;

        let request = ServiceRequest {
            id: Uuid::new_v4(),
            kind: OriginKind::Lead,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            fee_minor: service.fee_minor,
            requestor_id: agent.id,
            generated_by: Some(agent.id),
            customer_name: Some(customer_name.clone()),
            customer_phone: Some(customer_phone),
            status: TaskStatus::PendingAssignment,
            created_at: Utc::now(),
        };
        let remark = format!(
            "Lead created by {} ({}) for {customer_name}",
            agent.display_name, agent.custom_id
        );
        self.originate(request, &service, &cmd.documents, &remark)
            .await
    }

    async fn originate(
        &self,
        request: ServiceRequest,
        service: &Service,
        files: &[DocumentUpload],
        remark: &str,
    ) -> ResultEngine<CreatedRequest> {
        if !self
            .can_afford(request.requestor_id, request.fee_minor)
            .await?
        {
            return Err(EngineError::InsufficientFunds(format!(
                "{} costs {}",
                service.name,
                Money::new(request.fee_minor)
            )));
        }

        let stored = self.upload_all(files, &request.id.to_string()).await?;
        let result = self.originate_in(request, &stored, remark).await;
        let created = match result {
            Ok(created) => created,
            Err(err) => {
                self.discard_uploads(&stored).await;
                return Err(err);
            }
        };

        tracing::info!(
            request_id = %created.request.id,
            task_id = %created.task.id,
            kind = created.request.kind.as_str(),
            fee = created.request.fee_minor,
            "service request created"
        );
        self.notify_all(notify::task_created(&created.task)).await;
        Ok(created)
    }

    async fn originate_in(
        &self,
        request: ServiceRequest,
        stored: &[StoredDocument],
        remark: &str,
    ) -> ResultEngine<CreatedRequest> {
        with_tx!(self, |db_tx| {
            requests::ActiveModel::from(&request).insert(&db_tx).await?;
            self.insert_documents(&db_tx, request.id, stored, false)
                .await?;

            let task = Task {
                id: Uuid::new_v4(),
                origin_kind: request.kind,
                origin_id: request.id,
                service_id: request.service_id.clone(),
                service_name: request.service_name.clone(),
                fee_minor: request.fee_minor,
                assigned_agent_id: None,
                generated_by: request.generated_by,
                requestor_id: request.requestor_id,
                phase: TaskStatus::PendingAssignment.phase(),
                status: TaskStatus::PendingAssignment,
                ack_number: None,
                revision: 0,
                assigned_at: None,
                created_at: request.created_at,
                updated_at: request.created_at,
            };
            tasks::ActiveModel::from(&task).insert(&db_tx).await?;

            let entry = HistoryEntry {
                status: TaskStatus::PendingAssignment,
                remark: remark.to_string(),
                recorded_at: request.created_at,
            };
            self.append_history(&db_tx, request.id, &entry).await?;
            self.append_history(&db_tx, task.id, &entry).await?;

            if request.fee_minor > 0 {
                let description = format!("{} fee", request.service_name);
                self.post_ledger_entry(
                    &db_tx,
                    LedgerPosting {
                        account_id: request.requestor_id,
                        kind: TransactionKind::Debit,
                        amount_minor: request.fee_minor,
                        description: &description,
                        reference_id: Some(request.id),
                    },
                )
                .await?;
            }

            Ok(CreatedRequest { request, task })
        })
    }

    /// A request with its documents, history and the id of its task.
    pub async fn request(&self, request_id: Uuid) -> ResultEngine<RequestDetails> {
        with_tx!(self, |db_tx| {
            let request = self.require_request(&db_tx, request_id).await?;
            let task_id = tasks::Entity::find()
                .filter(tasks::Column::OriginId.eq(request_id))
                .one(&db_tx)
                .await?
                .map(|model| model.id);
            let documents = self.documents_of(&db_tx, request_id).await?;
            let history = self.history_of(&db_tx, request_id).await?;
            Ok(RequestDetails {
                request,
                task_id,
                documents,
                history,
            })
        })
    }

    /// Deletes every request, task, document row and history entry.
    ///
    /// Ledger rows and balances are untouched; fees already charged stay
    /// charged. Stored document files are removed afterwards, best effort.
    ///
    /// Authorization: admin only.
    pub async fn purge_requests(&self, actor_id: Uuid) -> ResultEngine<PurgeSummary> {
        let (summary, stored) = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let stored: Vec<StoredDocument> = documents::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| StoredDocument {
                    name: model.name,
                    size: model.size,
                    mime: model.mime,
                    path: model.path,
                })
                .collect();

            let history_entries = history::Entity::delete_many()
                .exec(&db_tx)
                .await?
                .rows_affected;
            let documents = documents::Entity::delete_many()
                .exec(&db_tx)
                .await?
                .rows_affected;
            let tasks = tasks::Entity::delete_many()
                .exec(&db_tx)
                .await?
                .rows_affected;
            let requests = requests::Entity::delete_many()
                .exec(&db_tx)
                .await?
                .rows_affected;
            Ok::<_, EngineError>((
                PurgeSummary {
                    requests,
                    tasks,
                    documents,
                    history_entries,
                },
                stored,
            ))
        })?;

        tracing::warn!(
            %actor_id,
            requests = summary.requests,
            tasks = summary.tasks,
            "all service requests purged"
        );
        self.discard_uploads(&stored).await;
        Ok(summary)
    }
}

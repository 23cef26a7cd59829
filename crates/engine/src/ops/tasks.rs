//! Task transitions.
//!
//! Every transition follows the same shape: validate the inputs, load the
//! task inside a database transaction, check the actor, ask
//! [`TaskStatus::next`] for the target status, then write it with
//! [`Engine::commit_transition`]. The write is conditional on the revision
//! that was read, so of two racing transitions exactly one lands and the
//! other gets `InvalidTransition`.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, AccountRole, Document, DocumentUpload, EngineError, HistoryEntry, ResultEngine,
    StoredDocument, SupplyDocsCmd, Task, TaskAction, TaskDetails, TaskFilter, TaskStatus,
    documents, history, requests, tasks,
    util::{normalize_required_text, remark_or, required_remark},
};

use super::{
    Engine,
    access::{ensure_assignee, ensure_can_supply},
    notify, with_tx,
};

/// Column changes that ride along with a status change.
#[derive(Debug, Default)]
pub(super) struct TaskChanges {
    assignee: Option<Option<Uuid>>,
    ack_number: Option<String>,
}

impl TaskChanges {
    fn assign(agent_id: Uuid) -> Self {
        Self {
            assignee: Some(Some(agent_id)),
            ..Default::default()
        }
    }

    fn unassign() -> Self {
        Self {
            assignee: Some(None),
            ..Default::default()
        }
    }

    fn ack(ack_number: String) -> Self {
        Self {
            ack_number: Some(ack_number),
            ..Default::default()
        }
    }
}

impl Engine {
    /// Writes `next` onto `task` and mirrors it onto the originating request.
    ///
    /// Appends one history entry under the task and the same entry under the
    /// request. Fails with `InvalidTransition` if the task changed since it
    /// was read.
    pub(super) async fn commit_transition(
        &self,
        db_tx: &DatabaseTransaction,
        task: &Task,
        next: TaskStatus,
        remark: &str,
        changes: TaskChanges,
    ) -> ResultEngine<Task> {
        let now = Utc::now();
        let mut updated = task.clone();
        updated.status = next;
        updated.phase = next.phase();
        updated.revision = task.revision + 1;
        updated.updated_at = now;

        let mut update = tasks::Entity::update_many()
            .col_expr(tasks::Column::Status, Expr::value(next.as_str()))
            .col_expr(tasks::Column::Phase, Expr::value(next.phase()))
            .col_expr(tasks::Column::Revision, Expr::value(updated.revision))
            .col_expr(tasks::Column::UpdatedAt, Expr::value(now));
        if let Some(assignee) = changes.assignee {
            let assigned_at: Option<DateTime<Utc>> = assignee.map(|_| now);
            update = update
                .col_expr(tasks::Column::AssignedAgentId, Expr::value(assignee))
                .col_expr(tasks::Column::AssignedAt, Expr::value(assigned_at));
            updated.assigned_agent_id = assignee;
            updated.assigned_at = assigned_at;
        }
        if let Some(ack_number) = changes.ack_number {
            update = update.col_expr(tasks::Column::AckNumber, Expr::value(ack_number.clone()));
            updated.ack_number = Some(ack_number);
        }

        let result = update
            .filter(tasks::Column::Id.eq(task.id))
            .filter(tasks::Column::Revision.eq(task.revision))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "task {} was modified concurrently",
                task.id
            )));
        }

        requests::Entity::update_many()
            .col_expr(requests::Column::Status, Expr::value(next.as_str()))
            .filter(requests::Column::Id.eq(task.origin_id))
            .exec(db_tx)
            .await?;

        let entry = HistoryEntry {
            status: next,
            remark: remark.to_string(),
            recorded_at: now,
        };
        self.append_history(db_tx, task.id, &entry).await?;
        self.append_history(db_tx, task.origin_id, &entry).await?;
        Ok(updated)
    }

    pub(super) async fn append_history(
        &self,
        db_tx: &DatabaseTransaction,
        subject_id: Uuid,
        entry: &HistoryEntry,
    ) -> ResultEngine<()> {
        let last_seq = history::Entity::find()
            .filter(history::Column::SubjectId.eq(subject_id))
            .order_by_desc(history::Column::Seq)
            .one(db_tx)
            .await?
            .map_or(0, |model| model.seq);
        history::ActiveModel::for_subject(subject_id, last_seq + 1, entry)
            .insert(db_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn history_of<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        subject_id: Uuid,
    ) -> ResultEngine<Vec<HistoryEntry>> {
        history::Entity::find()
            .filter(history::Column::SubjectId.eq(subject_id))
            .order_by_asc(history::Column::Seq)
            .all(db)
            .await?
            .into_iter()
            .map(HistoryEntry::try_from)
            .collect()
    }

    pub(super) async fn documents_of<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        request_id: Uuid,
    ) -> ResultEngine<Vec<Document>> {
        let rows = documents::Entity::find()
            .filter(documents::Column::RequestId.eq(request_id))
            .order_by_asc(documents::Column::UploadedAt)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    /// Whether the task has ever been handed to an agent.
    async fn was_assigned_before(
        &self,
        db_tx: &DatabaseTransaction,
        task_id: Uuid,
    ) -> ResultEngine<bool> {
        let entry = history::Entity::find()
            .filter(history::Column::SubjectId.eq(task_id))
            .filter(history::Column::Status.eq(TaskStatus::Assigned.as_str()))
            .one(db_tx)
            .await?;
        Ok(entry.is_some())
    }

    /// A task with its origin's documents and its own history.
    pub async fn task(&self, task_id: Uuid) -> ResultEngine<TaskDetails> {
        with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, task_id).await?;
            let documents = self.documents_of(&db_tx, task.origin_id).await?;
            let history = self.history_of(&db_tx, task.id).await?;
            Ok(TaskDetails {
                task,
                documents,
                history,
            })
        })
    }

    /// Tasks matching `filter`, newest first.
    pub async fn tasks(&self, filter: TaskFilter) -> ResultEngine<Vec<Task>> {
        let mut query = tasks::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(tasks::Column::Status.eq(status.as_str()));
        }
        if let Some(agent_id) = filter.assigned_agent_id {
            query = query.filter(tasks::Column::AssignedAgentId.eq(agent_id));
        }
        query
            .order_by_desc(tasks::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect()
    }

    /// Hands a pending task to an agent.
    ///
    /// A lead's generating agent cannot take their own lead the first time
    /// it is assigned; once some agent has rejected it, anyone can.
    ///
    /// Authorization: admin only.
    pub async fn assign_task(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        agent_id: Uuid,
    ) -> ResultEngine<Task> {
        let task = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::Assign)?;

            let agent = self
                .require_role(&db_tx, agent_id, AccountRole::Agent)
                .await?;
            if !agent.is_available {
                return Err(EngineError::Validation(format!(
                    "agent {} is not available",
                    agent.custom_id
                )));
            }
            if task.generated_by == Some(agent_id)
                && !self.was_assigned_before(&db_tx, task.id).await?
            {
                return Err(EngineError::AssignmentConstraintViolated(
                    "a lead cannot be assigned to the agent who generated it".to_string(),
                ));
            }

            let remark = format!(
                "Assigned to {} ({})",
                agent.display_name, agent.custom_id
            );
            self.commit_transition(&db_tx, &task, next, &remark, TaskChanges::assign(agent_id))
                .await
        })?;
        self.notify_all(notify::task_assigned(&task, agent_id)).await;
        Ok(task)
    }

    pub async fn accept_task(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        remark: Option<&str>,
    ) -> ResultEngine<Task> {
        let remark = remark_or(remark, "Task accepted by agent");
        let task = with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::Accept)?;
            ensure_assignee(&task, actor_id)?;
            self.commit_transition(&db_tx, &task, next, &remark, TaskChanges::default())
                .await
        })?;
        self.notify_all(notify::task_progress(
            &task,
            "Request Accepted",
            format!("An agent has started working on your {} request.", task.service_name),
        ))
        .await;
        Ok(task)
    }

    /// The assigned agent gives the task back for reassignment.
    pub async fn reject_task(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        remark: &str,
    ) -> ResultEngine<Task> {
        let remark = required_remark(remark)?;
        let (task, agent_name) = with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::Reject)?;
            ensure_assignee(&task, actor_id)?;
            let agent = self.require_account(&db_tx, actor_id).await?;
            let task = self
                .commit_transition(&db_tx, &task, next, &remark, TaskChanges::unassign())
                .await?;
            Ok::<_, EngineError>((task, agent.display_name))
        })?;
        self.notify_all(notify::task_rejected(&task, &agent_name, &remark))
            .await;
        Ok(task)
    }

    /// Asks the requestor for more documents; the phase decides whether the
    /// request comes from the agent or the issuing department.
    pub async fn request_documents(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        remark: &str,
    ) -> ResultEngine<Task> {
        let remark = required_remark(remark)?;
        let task = with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::RequestDocuments)?;
            ensure_assignee(&task, actor_id)?;
            self.commit_transition(&db_tx, &task, next, &remark, TaskChanges::default())
                .await
        })?;
        self.notify_all(notify::documents_requested(&task, &remark))
            .await;
        Ok(task)
    }

    /// Uploads the requested documents and resumes at `cmd.resume_at`.
    pub async fn supply_documents(&self, cmd: SupplyDocsCmd) -> ResultEngine<Task> {
        if cmd.documents.is_empty() {
            return Err(EngineError::Validation(
                "at least one document is required".to_string(),
            ));
        }
        let remark = remark_or(cmd.remark.as_deref(), "Additional documents uploaded");
        let action = TaskAction::SupplyDocuments(cmd.resume_at);

        // Checked before uploading so a doomed call leaves no files behind.
        let task = self.require_task(&self.database, cmd.task_id).await?;
        let actor = self.require_account(&self.database, cmd.actor_id).await?;
        ensure_can_supply(&task, &actor)?;
        task.status.next(action)?;

        let stored = self
            .upload_all(&cmd.documents, &task.origin_id.to_string())
            .await?;
        let result = self
            .supply_documents_in(&cmd, &actor, &remark, &stored)
            .await;
        if result.is_err() {
            self.discard_uploads(&stored).await;
        }
        let task = result?;
        self.notify_all(notify::documents_supplied(&task)).await;
        Ok(task)
    }

    async fn supply_documents_in(
        &self,
        cmd: &SupplyDocsCmd,
        actor: &Account,
        remark: &str,
        stored: &[StoredDocument],
    ) -> ResultEngine<Task> {
        with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, cmd.task_id).await?;
            ensure_can_supply(&task, actor)?;
            let next = task
                .status
                .next(TaskAction::SupplyDocuments(cmd.resume_at))?;
            self.insert_documents(&db_tx, task.origin_id, stored, false)
                .await?;
            self.commit_transition(&db_tx, &task, next, remark, TaskChanges::default())
                .await
        })
    }

    /// Records the department's acknowledgement number.
    pub async fn submit_ack(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        ack_number: &str,
        remark: Option<&str>,
    ) -> ResultEngine<Task> {
        let ack_number = normalize_required_text(ack_number, "acknowledgement number")?;
        let remark = remark_or(
            remark,
            &format!("Application submitted. Acknowledgement number: {ack_number}"),
        );
        let task = with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::SubmitAck)?;
            ensure_assignee(&task, actor_id)?;
            self.commit_transition(&db_tx, &task, next, &remark, TaskChanges::ack(ack_number))
                .await
        })?;
        self.notify_all(notify::task_progress(
            &task,
            "Application Submitted",
            format!(
                "Your {} application was filed. Acknowledgement number: {}.",
                task.service_name,
                task.ack_number.as_deref().unwrap_or_default()
            ),
        ))
        .await;
        Ok(task)
    }

    /// Uploads completion proof and sends the task for commission approval.
    pub async fn complete_task(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        proof: Vec<DocumentUpload>,
        remark: Option<&str>,
    ) -> ResultEngine<Task> {
        if proof.is_empty() {
            return Err(EngineError::Validation(
                "at least one completion proof document is required".to_string(),
            ));
        }
        let remark = remark_or(remark, "Task completed. Proof uploaded.");

        let task = self.require_task(&self.database, task_id).await?;
        task.status.next(TaskAction::Complete)?;
        ensure_assignee(&task, actor_id)?;

        let stored = self
            .upload_all(&proof, &task.origin_id.to_string())
            .await?;
        let result = self
            .complete_task_in(actor_id, task_id, &remark, &stored)
            .await;
        if result.is_err() {
            self.discard_uploads(&stored).await;
        }
        let task = result?;
        self.notify_all(notify::task_completed(&task, actor_id)).await;
        Ok(task)
    }

    async fn complete_task_in(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        remark: &str,
        stored: &[StoredDocument],
    ) -> ResultEngine<Task> {
        with_tx!(self, |db_tx| {
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::Complete)?;
            ensure_assignee(&task, actor_id)?;
            self.insert_documents(&db_tx, task.origin_id, stored, true)
                .await?;
            self.commit_transition(&db_tx, &task, next, remark, TaskChanges::default())
                .await
        })
    }

    pub(super) async fn insert_documents(
        &self,
        db_tx: &DatabaseTransaction,
        request_id: Uuid,
        stored: &[StoredDocument],
        is_proof: bool,
    ) -> ResultEngine<Vec<Document>> {
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(stored.len());
        for doc in stored {
            let document = Document::from_stored(request_id, doc.clone(), is_proof, now);
            documents::ActiveModel::from(&document).insert(db_tx).await?;
            inserted.push(document);
        }
        Ok(inserted)
    }
}

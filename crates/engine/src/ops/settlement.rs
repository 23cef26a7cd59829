//! Commission approval and settlement.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CommissionEntry, CommissionSplit, EngineError, ResultEngine, Task, TaskAction,
    TransactionKind, commission,
    util::{remark_or, required_remark},
};

use super::{Engine, ledger::LedgerPosting, notify, tasks::TaskChanges, with_tx};

/// Outcome of an approved commission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub task: Task,
    pub entry: CommissionEntry,
}

impl Engine {
    /// Approves the commission of a completed task and pays everyone out.
    ///
    /// The credits, the commission-ledger row and the status change commit
    /// together. If any credit fails the whole settlement is rolled back,
    /// the task stays in `pending_commission_approval` and the call returns
    /// `SettlementFailure`; retrying is safe.
    ///
    /// Authorization: admin only.
    pub async fn approve_commission(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        remark: Option<&str>,
    ) -> ResultEngine<Settlement> {
        let remark = remark_or(remark, "Commission approved");
        let settlement = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::ApproveCommission)?;
            let split = CommissionSplit::for_task(&task);

            if let Err(err) = self.pay_out(&db_tx, &task, &split).await {
                tracing::error!(%task_id, error = %err, "settlement rolled back");
                return Err(err);
            }

            let entry = CommissionEntry {
                id: Uuid::new_v4(),
                task_id: task.id,
                service_name: task.service_name.clone(),
                admin_share: split.admin_share,
                assigned_share: split.assigned_share,
                generating_share: split.generating_share,
                recorded_at: Utc::now(),
            };
            commission::ActiveModel::from(&entry).insert(&db_tx).await?;

            let task = self
                .commit_transition(&db_tx, &task, next, &remark, TaskChanges::default())
                .await?;
            Ok::<_, EngineError>(Settlement { task, entry })
        })?;

        tracing::info!(
            %task_id,
            admin = settlement.entry.admin_share,
            assigned = settlement.entry.assigned_share,
            generating = settlement.entry.generating_share,
            "commission settled"
        );

        let mut payees = Vec::new();
        if let Some(agent_id) = settlement.task.assigned_agent_id
            && settlement.entry.assigned_share > 0
        {
            payees.push((agent_id, settlement.entry.assigned_share));
        }
        if let Some(generator) = settlement.task.generated_by
            && settlement.entry.generating_share > 0
        {
            payees.push((generator, settlement.entry.generating_share));
        }
        self.notify_all(notify::commission_approved(&settlement.task, &payees))
            .await;
        Ok(settlement)
    }

    /// Credits every non-zero share. Any failure becomes `SettlementFailure`.
    async fn pay_out(
        &self,
        db_tx: &DatabaseTransaction,
        task: &Task,
        split: &CommissionSplit,
    ) -> ResultEngine<()> {
        let description = format!("Commission for {}", task.service_name);
        let mut postings = Vec::with_capacity(3);
        if let Some(agent_id) = task.assigned_agent_id {
            postings.push((agent_id, TransactionKind::Payout, split.assigned_share));
        }
        if let Some(generator) = task.generated_by {
            postings.push((generator, TransactionKind::Payout, split.generating_share));
        }
        postings.push((
            self.platform_account_id,
            TransactionKind::Commission,
            split.admin_share,
        ));

        for (account_id, kind, amount_minor) in postings {
            if amount_minor == 0 {
                continue;
            }
            self.post_ledger_entry(
                db_tx,
                LedgerPosting {
                    account_id,
                    kind,
                    amount_minor,
                    description: &description,
                    reference_id: Some(task.id),
                },
            )
            .await
            .map_err(|err| {
                EngineError::SettlementFailure(format!("credit to {account_id} failed: {err}"))
            })?;
        }
        Ok(())
    }

    /// Closes a completed task without paying anyone.
    ///
    /// Authorization: admin only.
    pub async fn reject_commission(
        &self,
        actor_id: Uuid,
        task_id: Uuid,
        remark: &str,
    ) -> ResultEngine<Task> {
        let remark = required_remark(remark)?;
        let task = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let task = self.require_task(&db_tx, task_id).await?;
            let next = task.status.next(TaskAction::RejectCommission)?;
            self.commit_transition(&db_tx, &task, next, &remark, TaskChanges::default())
                .await
        })?;
        self.notify_all(notify::commission_rejected(&task, &remark))
            .await;
        Ok(task)
    }

    /// Commission-ledger rows, newest first.
    pub async fn commission_entries(&self) -> ResultEngine<Vec<CommissionEntry>> {
        let rows = commission::Entity::find()
            .order_by_desc(commission::Column::RecordedAt)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(CommissionEntry::from).collect())
    }
}

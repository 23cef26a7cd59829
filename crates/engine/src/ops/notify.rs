//! Notification fan-out.
//!
//! Called after the database transaction has committed. Failures and
//! timeouts are logged and dropped.

use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{AccountRole, Money, Notification, NotifyTarget, Severity, Task};

use super::Engine;

fn task_link(task_id: Uuid) -> String {
    format!("/tasks/{task_id}")
}

impl Engine {
    /// Delivers every notification concurrently, so the wait is bounded by a
    /// single collaborator timeout however many recipients there are.
    pub(super) async fn notify_all(&self, notifications: Vec<Notification>) {
        let mut deliveries = JoinSet::new();
        for notification in notifications {
            let notifier = self.notifier.clone();
            let timeout = self.collaborator_timeout;
            deliveries.spawn(async move {
                let recipient = notification.target;
                let delivery = tokio::time::timeout(timeout, notifier.notify(notification)).await;
                (recipient, delivery)
            });
        }

        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok((_, Ok(Ok(())))) => {}
                Ok((recipient, Ok(Err(err)))) => {
                    tracing::warn!(?recipient, error = %err, "notification not delivered");
                }
                Ok((recipient, Err(_))) => {
                    tracing::warn!(?recipient, "notification timed out");
                }
                Err(err) => tracing::warn!(error = %err, "notification task failed"),
            }
        }
    }
}

pub(super) fn task_created(task: &Task) -> Vec<Notification> {
    let kind = task.origin_kind.as_str();
    vec![
        Notification::new(
            NotifyTarget::Role(AccountRole::Admin),
            "New Task Created",
            format!(
                "A new {kind} for {} is waiting for assignment.",
                task.service_name
            ),
            Severity::Info,
        )
        .deep_link(task_link(task.id)),
    ]
}

pub(super) fn task_assigned(task: &Task, agent_id: Uuid) -> Vec<Notification> {
    vec![
        Notification::new(
            NotifyTarget::Account(agent_id),
            "New Task Assigned",
            format!("You have been assigned a task for {}.", task.service_name),
            Severity::Info,
        )
        .deep_link(task_link(task.id)),
        Notification::new(
            NotifyTarget::Account(task.requestor_id),
            "Request Assigned",
            format!(
                "Your request for {} has been assigned to an agent.",
                task.service_name
            ),
            Severity::Info,
        )
        .deep_link(task_link(task.id)),
    ]
}

/// Agent moved the task forward (accept, docs requested, ack, docs supplied).
pub(super) fn task_progress(task: &Task, title: &str, message: String) -> Vec<Notification> {
    vec![
        Notification::new(
            NotifyTarget::Account(task.requestor_id),
            title,
            message,
            Severity::Info,
        )
        .deep_link(task_link(task.id)),
    ]
}

pub(super) fn documents_requested(task: &Task, remark: &str) -> Vec<Notification> {
    vec![
        Notification::new(
            NotifyTarget::Account(task.requestor_id),
            "Additional Documents Required",
            format!(
                "More documents are needed for {}: {remark}",
                task.service_name
            ),
            Severity::Warning,
        )
        .deep_link(task_link(task.id)),
    ]
}

pub(super) fn documents_supplied(task: &Task) -> Vec<Notification> {
    task.assigned_agent_id
        .map(|agent_id| {
            Notification::new(
                NotifyTarget::Account(agent_id),
                "Documents Uploaded",
                format!(
                    "The requested documents for {} have been uploaded.",
                    task.service_name
                ),
                Severity::Info,
            )
            .deep_link(task_link(task.id))
        })
        .into_iter()
        .collect()
}

pub(super) fn task_rejected(task: &Task, agent_name: &str, remark: &str) -> Vec<Notification> {
    vec![
        Notification::new(
            NotifyTarget::Role(AccountRole::Admin),
            "Task Rejected by Agent",
            format!(
                "{agent_name} rejected the {} task: {remark}. It needs to be reassigned.",
                task.service_name
            ),
            Severity::Warning,
        )
        .deep_link(task_link(task.id)),
        Notification::new(
            NotifyTarget::Account(task.requestor_id),
            "Request Update",
            format!(
                "Your request for {} is being reassigned to another agent.",
                task.service_name
            ),
            Severity::Info,
        )
        .deep_link(task_link(task.id)),
    ]
}

pub(super) fn task_completed(task: &Task, agent_id: Uuid) -> Vec<Notification> {
    vec![
        Notification::new(
            NotifyTarget::Role(AccountRole::Admin),
            "Commission Approval Needed",
            format!(
                "The {} task is complete and awaits commission approval.",
                task.service_name
            ),
            Severity::Warning,
        )
        .deep_link(task_link(task.id)),
        Notification::new(
            NotifyTarget::Account(agent_id),
            "Task Completed",
            format!(
                "You completed the {} task. Your commission is pending approval.",
                task.service_name
            ),
            Severity::Success,
        )
        .deep_link(task_link(task.id)),
    ]
}

/// Everyone paid by a settlement, with their share.
pub(super) fn commission_approved(task: &Task, payees: &[(Uuid, i64)]) -> Vec<Notification> {
    payees
        .iter()
        .map(|(account_id, amount)| {
            Notification::new(
                NotifyTarget::Account(*account_id),
                "Commission Approved",
                format!(
                    "{} has been credited to your wallet for {}.",
                    Money::new(*amount),
                    task.service_name
                ),
                Severity::Success,
            )
            .deep_link("/wallet")
        })
        .collect()
}

pub(super) fn commission_rejected(task: &Task, remark: &str) -> Vec<Notification> {
    let mut agents: Vec<Uuid> = task.assigned_agent_id.into_iter().collect();
    if let Some(generator) = task.generated_by
        && !agents.contains(&generator)
    {
        agents.push(generator);
    }
    agents
        .into_iter()
        .map(|agent_id| {
            Notification::new(
                NotifyTarget::Account(agent_id),
                "Commission Rejected",
                format!(
                    "The commission for {} was rejected: {remark}",
                    task.service_name
                ),
                Severity::Error,
            )
            .deep_link(task_link(task.id))
        })
        .collect()
}

pub(super) fn wallet_movement(account_id: Uuid, title: &str, message: String) -> Vec<Notification> {
    vec![
        Notification::new(
            NotifyTarget::Account(account_id),
            title,
            message,
            Severity::Success,
        )
        .deep_link("/wallet"),
    ]
}

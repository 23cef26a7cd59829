use sea_orm::{ConnectionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountRole, EngineError, ResultEngine, ServiceRequest, Task, accounts, requests,
    tasks,
};

use super::Engine;

impl Engine {
    pub(super) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// Loads `account_id` and checks it has `role`.
    ///
    /// Used for the *subject* of an operation (who pays, who gets assigned);
    /// a wrong role is a validation problem, not an authorization one.
    pub(super) async fn require_role<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: Uuid,
        role: AccountRole,
    ) -> ResultEngine<Account> {
        let account = self.require_account(db, account_id).await?;
        if account.role != role {
            return Err(EngineError::Validation(format!(
                "account {} is not a {}",
                account.custom_id,
                role.as_str()
            )));
        }
        Ok(account)
    }

    /// Loads the acting account and checks it is an administrator.
    pub(super) async fn require_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        actor_id: Uuid,
    ) -> ResultEngine<Account> {
        let actor = self.require_account(db, actor_id).await?;
        if actor.role != AccountRole::Admin {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(actor)
    }

    pub(super) async fn require_task<C: ConnectionTrait>(
        &self,
        db: &C,
        task_id: Uuid,
    ) -> ResultEngine<Task> {
        let model = tasks::Entity::find_by_id(task_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("task not exists".to_string()))?;
        Task::try_from(model)
    }

    pub(super) async fn require_request<C: ConnectionTrait>(
        &self,
        db: &C,
        request_id: Uuid,
    ) -> ResultEngine<ServiceRequest> {
        let model = requests::Entity::find_by_id(request_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("service request not exists".to_string()))?;
        ServiceRequest::try_from(model)
    }
}

/// Agent actions belong to whoever currently holds the task.
pub(super) fn ensure_assignee(task: &Task, actor_id: Uuid) -> ResultEngine<()> {
    if task.assigned_agent_id != Some(actor_id) {
        return Err(EngineError::Forbidden(
            "only the assigned agent can act on this task".to_string(),
        ));
    }
    Ok(())
}

/// Documents may be supplied by anyone involved in the task, or an admin.
pub(super) fn ensure_can_supply(task: &Task, actor: &Account) -> ResultEngine<()> {
    if actor.role == AccountRole::Admin || task.involves(actor.id) {
        return Ok(());
    }
    Err(EngineError::Forbidden(
        "only the requestor, the agents on the task or an admin can supply documents".to_string(),
    ))
}

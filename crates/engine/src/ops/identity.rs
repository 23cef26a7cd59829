//! Account and bank-account passthroughs.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, AccountRole, BankAccount, EngineError, ResultEngine, accounts, bank_accounts,
    util::{is_unique_violation, normalize_required_text},
};

use super::{Engine, with_tx};

const CUSTOM_ID_ATTEMPTS: usize = 5;

impl Engine {
    /// Registers a new wallet holder with a zero balance.
    ///
    /// The platform account is created by the engine itself and cannot be
    /// added here.
    pub async fn create_account(
        &self,
        role: AccountRole,
        display_name: &str,
    ) -> ResultEngine<Account> {
        if role == AccountRole::Platform {
            return Err(EngineError::Validation(
                "the platform account already exists".to_string(),
            ));
        }
        let display_name = normalize_required_text(display_name, "display name")?;

        // Custom ids are sequential per role. A concurrent registration can
        // still take the number between the lookup and the insert.
        let mut attempt = 1;
        loop {
            match self.insert_account(role, &display_name).await {
                Err(EngineError::Database(err)) if is_unique_violation(&err) => {
                    if attempt == CUSTOM_ID_ATTEMPTS {
                        return Err(EngineError::ExistingKey(format!(
                            "{} custom id",
                            role.custom_id_prefix()
                        )));
                    }
                    tracing::debug!(role = role.as_str(), attempt, "custom id taken, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn insert_account(&self, role: AccountRole, display_name: &str) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let mut seq = accounts::Entity::find()
                .filter(accounts::Column::Role.eq(role.as_str()))
                .count(&db_tx)
                .await?
                + 1;
            let mut custom_id = format!("{}-{seq:04}", role.custom_id_prefix());
            while accounts::Entity::find()
                .filter(accounts::Column::CustomId.eq(custom_id.clone()))
                .one(&db_tx)
                .await?
                .is_some()
            {
                seq += 1;
                custom_id = format!("{}-{seq:04}", role.custom_id_prefix());
            }

            let account = Account {
                id: Uuid::new_v4(),
                role,
                display_name: display_name.to_string(),
                custom_id,
                balance: 0,
                is_available: role == AccountRole::Agent,
                created_at: Utc::now(),
            };
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }

    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        self.require_account(&self.database, account_id).await
    }

    /// Agents ordered by custom id, optionally only those taking work.
    pub async fn agents(&self, only_available: bool) -> ResultEngine<Vec<Account>> {
        let mut query =
            accounts::Entity::find().filter(accounts::Column::Role.eq(AccountRole::Agent.as_str()));
        if only_available {
            query = query.filter(accounts::Column::IsAvailable.eq(true));
        }
        query
            .order_by_asc(accounts::Column::CustomId)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Toggles whether an agent can be assigned new tasks.
    ///
    /// Authorization: the agent themselves or an admin.
    pub async fn set_agent_availability(
        &self,
        actor_id: Uuid,
        agent_id: Uuid,
        available: bool,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            if actor_id != agent_id {
                self.require_admin(&db_tx, actor_id).await?;
            }
            let mut agent = self
                .require_role(&db_tx, agent_id, AccountRole::Agent)
                .await?;
            let active = accounts::ActiveModel {
                id: ActiveValue::Set(agent_id),
                is_available: ActiveValue::Set(available),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            agent.is_available = available;
            Ok(agent)
        })
    }

    pub async fn add_bank_account(
        &self,
        account_id: Uuid,
        account_number: &str,
        ifsc: &str,
        holder_name: &str,
    ) -> ResultEngine<BankAccount> {
        let account_number = normalize_required_text(account_number, "account number")?;
        let ifsc = normalize_required_text(ifsc, "IFSC")?.to_uppercase();
        let holder_name = normalize_required_text(holder_name, "holder name")?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let duplicate = bank_accounts::Entity::find()
                .filter(bank_accounts::Column::AccountId.eq(account_id))
                .filter(bank_accounts::Column::AccountNumber.eq(account_number.clone()))
                .filter(bank_accounts::Column::Ifsc.eq(ifsc.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if duplicate {
                return Err(EngineError::ExistingKey(account_number));
            }

            let model = bank_accounts::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                account_id: ActiveValue::Set(account_id),
                account_number: ActiveValue::Set(account_number),
                ifsc: ActiveValue::Set(ifsc),
                holder_name: ActiveValue::Set(holder_name),
            }
            .insert(&db_tx)
            .await?;
            Ok(BankAccount::from(model))
        })
    }

    pub async fn bank_accounts(&self, account_id: Uuid) -> ResultEngine<Vec<BankAccount>> {
        let rows = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::AccountId.eq(account_id))
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(BankAccount::from).collect())
    }

    pub async fn remove_bank_account(
        &self,
        account_id: Uuid,
        bank_account_id: Uuid,
    ) -> ResultEngine<()> {
        let result = bank_accounts::Entity::delete_many()
            .filter(bank_accounts::Column::Id.eq(bank_account_id))
            .filter(bank_accounts::Column::AccountId.eq(account_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(
                "bank account not exists".to_string(),
            ));
        }
        Ok(())
    }
}

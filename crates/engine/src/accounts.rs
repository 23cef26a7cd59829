//! Wallet holders: customers, agents, administrators and the platform.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Customer,
    /// Village-level entrepreneur: fulfills tasks and generates leads.
    Agent,
    Admin,
    Platform,
}

impl AccountRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Agent => "agent",
            Self::Admin => "admin",
            Self::Platform => "platform",
        }
    }

    /// Prefix of the human readable id (`VLE-0007`).
    pub(crate) fn custom_id_prefix(self) -> &'static str {
        match self {
            Self::Customer => "CUS",
            Self::Agent => "VLE",
            Self::Admin => "ADM",
            Self::Platform => "PLT",
        }
    }
}

impl TryFrom<&str> for AccountRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "customer" => Ok(Self::Customer),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            "platform" => Ok(Self::Platform),
            other => Err(EngineError::Validation(format!(
                "invalid account role: {other}"
            ))),
        }
    }
}

/// Snapshot of an account.
///
/// `balance` is denormalized: it always equals the running sum of the
/// account's ledger transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub role: AccountRole,
    pub display_name: String,
    pub custom_id: String,
    pub balance: i64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub role: String,
    pub display_name: String,
    pub custom_id: String,
    pub balance: i64,
    pub is_available: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::bank_accounts::Entity")]
    BankAccounts,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            display_name: ActiveValue::Set(value.display_name.clone()),
            custom_id: ActiveValue::Set(value.custom_id.clone()),
            balance: ActiveValue::Set(value.balance),
            is_available: ActiveValue::Set(value.is_available),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            role: AccountRole::try_from(model.role.as_str())?,
            display_name: model.display_name,
            custom_id: model.custom_id,
            balance: model.balance,
            is_available: model.is_available,
            created_at: model.created_at,
        })
    }
}

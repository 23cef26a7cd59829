//! Ledger primitives.
//!
//! A [`Transaction`] is an immutable entry in an account's log. Amounts are
//! signed minor units: positive values increase the balance, negative values
//! decrease it. Each entry snapshots the balance right after it was applied
//! (`balance_after`), and entries are ordered per account by `seq`.
//!
//! Rows are only ever inserted; nothing in the engine updates or deletes
//! them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Debit,
    Credit,
    Payout,
    Refund,
    Commission,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Payout => "payout",
            Self::Refund => "refund",
            Self::Commission => "commission",
        }
    }

    /// Whether entries of this kind take money out of the account.
    pub fn is_outgoing(self) -> bool {
        matches!(self, Self::Withdrawal | Self::Debit)
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            "payout" => Ok(Self::Payout),
            "refund" => Ok(Self::Refund),
            "commission" => Ok(Self::Commission),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub seq: i64,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: String,
    /// Task or service request the entry belongs to, if any.
    pub reference_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub balance_after: i64,
}

/// Result of replaying an account's log from zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub account_id: Uuid,
    pub stored_balance: i64,
    pub replayed_balance: i64,
    pub transactions: usize,
    /// Ids of entries whose `balance_after` disagrees with the replay.
    pub mismatched: Vec<Uuid>,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.mismatched.is_empty() && self.stored_balance == self.replayed_balance
    }
}

/// Balance plus the log, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDetails {
    pub account_id: Uuid,
    pub balance: i64,
    pub transactions: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub seq: i64,
    pub kind: String,
    pub amount_minor: i64,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub occurred_at: DateTimeUtc,
    pub balance_after: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            account_id: ActiveValue::Set(tx.account_id),
            seq: ActiveValue::Set(tx.seq),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            reference_id: ActiveValue::Set(tx.reference_id),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            balance_after: ActiveValue::Set(tx.balance_after),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            seq: model.seq,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            reference_id: model.reference_id,
            occurred_at: model.occurred_at,
            balance_after: model.balance_after,
        })
    }
}

/// Replays `log` (already in `seq` order) and checks every snapshot.
pub(crate) fn audit_log(account_id: Uuid, stored_balance: i64, log: &[Transaction]) -> LedgerAudit {
    let mut running = 0i64;
    let mut mismatched = Vec::new();
    for tx in log {
        running += tx.amount_minor;
        if tx.balance_after != running {
            mismatched.push(tx.id);
        }
    }
    LedgerAudit {
        account_id,
        stored_balance,
        replayed_balance: running,
        transactions: log.len(),
        mismatched,
    }
}

//! The only code path that changes a balance.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, Transaction, TransactionKind, accounts, ledger};

use super::Engine;

/// One balance movement. `amount_minor` is a magnitude; the sign comes from
/// `kind`.
pub(super) struct LedgerPosting<'a> {
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: &'a str,
    pub reference_id: Option<Uuid>,
}

impl Engine {
    /// Applies `posting` to the account balance and appends the matching
    /// ledger row, both inside `db_tx`.
    ///
    /// The balance changes through a single conditional `UPDATE`, so two
    /// concurrent debits serialize on the row and neither can overdraw: when
    /// the guard `balance >= amount` fails no row is touched and the result
    /// is `InsufficientFunds`.
    pub(super) async fn post_ledger_entry(
        &self,
        db_tx: &DatabaseTransaction,
        posting: LedgerPosting<'_>,
    ) -> ResultEngine<Transaction> {
        if posting.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let delta = if posting.kind.is_outgoing() {
            -posting.amount_minor
        } else {
            posting.amount_minor
        };

        let mut update = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(posting.account_id));
        if delta < 0 {
            update = update.filter(accounts::Column::Balance.gte(posting.amount_minor));
        }
        let result = update.exec(db_tx).await?;

        if result.rows_affected == 0 {
            let account = accounts::Entity::find_by_id(posting.account_id)
                .one(db_tx)
                .await?;
            return Err(match account {
                Some(model) => EngineError::InsufficientFunds(format!(
                    "balance {} is less than {}",
                    Money::new(model.balance),
                    Money::new(posting.amount_minor)
                )),
                None => EngineError::KeyNotFound("account not exists".to_string()),
            });
        }

        let balance_after = accounts::Entity::find_by_id(posting.account_id)
            .one(db_tx)
            .await?
            .map(|model| model.balance)
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;

        let last_seq = ledger::Entity::find()
            .filter(ledger::Column::AccountId.eq(posting.account_id))
            .order_by_desc(ledger::Column::Seq)
            .one(db_tx)
            .await?
            .map_or(0, |model| model.seq);

        let tx = Transaction {
            id: Uuid::new_v4(),
            account_id: posting.account_id,
            seq: last_seq + 1,
            kind: posting.kind,
            amount_minor: delta,
            description: posting.description.to_string(),
            reference_id: posting.reference_id,
            occurred_at: Utc::now(),
            balance_after,
        };
        ledger::ActiveModel::from(&tx).insert(db_tx).await?;
        Ok(tx)
    }
}

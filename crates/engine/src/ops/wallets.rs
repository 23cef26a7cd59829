use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AccountRole, EngineError, LedgerAudit, Money, ResultEngine, Transaction, TransactionKind,
    WalletDetails, bank_accounts, ledger,
    util::{normalize_required_text, require_positive},
};

use super::{Engine, ledger::LedgerPosting, notify, with_tx};

impl Engine {
    /// Current balance in minor units.
    pub async fn balance(&self, account_id: Uuid) -> ResultEngine<i64> {
        Ok(self
            .require_account(&self.database, account_id)
            .await?
            .balance)
    }

    /// Advisory check; the debit itself re-checks atomically.
    pub async fn can_afford(&self, account_id: Uuid, amount_minor: i64) -> ResultEngine<bool> {
        Ok(self.balance(account_id).await? >= amount_minor)
    }

    /// Takes `amount_minor` out of the account.
    ///
    /// Fails with `InsufficientFunds` if the balance at the moment of the
    /// update is lower than the amount.
    pub async fn debit(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        description: &str,
    ) -> ResultEngine<Transaction> {
        require_positive(amount_minor, "amount_minor")?;
        with_tx!(self, |db_tx| {
            self.post_ledger_entry(
                &db_tx,
                LedgerPosting {
                    account_id,
                    kind: TransactionKind::Debit,
                    amount_minor,
                    description,
                    reference_id: None,
                },
            )
            .await
        })
    }

    pub async fn credit(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        description: &str,
    ) -> ResultEngine<Transaction> {
        require_positive(amount_minor, "amount_minor")?;
        with_tx!(self, |db_tx| {
            self.post_ledger_entry(
                &db_tx,
                LedgerPosting {
                    account_id,
                    kind: TransactionKind::Credit,
                    amount_minor,
                    description,
                    reference_id: None,
                },
            )
            .await
        })
    }

    /// Wallet top-up.
    pub async fn deposit(&self, account_id: Uuid, amount_minor: i64) -> ResultEngine<Transaction> {
        require_positive(amount_minor, "amount_minor")?;
        let tx = with_tx!(self, |db_tx| {
            self.post_ledger_entry(
                &db_tx,
                LedgerPosting {
                    account_id,
                    kind: TransactionKind::Deposit,
                    amount_minor,
                    description: "Wallet top-up",
                    reference_id: None,
                },
            )
            .await
        })?;
        self.notify_all(notify::wallet_movement(
            account_id,
            "Funds Added",
            format!(
                "{} was added to your wallet. New balance: {}.",
                Money::new(amount_minor),
                Money::new(tx.balance_after)
            ),
        ))
        .await;
        Ok(tx)
    }

    /// Moves money out to one of the holder's own bank accounts.
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        bank_account_id: Uuid,
        description: &str,
    ) -> ResultEngine<Transaction> {
        require_positive(amount_minor, "amount_minor")?;
        let description = normalize_required_text(description, "description")?;
        let tx = with_tx!(self, |db_tx| {
            let bank_account = bank_accounts::Entity::find_by_id(bank_account_id)
                .one(&db_tx)
                .await?
                .filter(|model| model.account_id == account_id)
                .ok_or_else(|| {
                    EngineError::Validation(
                        "bank account does not belong to this account".to_string(),
                    )
                })?;
            let description = format!(
                "{description} (to {} ****{})",
                bank_account.ifsc,
                last_four(&bank_account.account_number)
            );
            self.post_ledger_entry(
                &db_tx,
                LedgerPosting {
                    account_id,
                    kind: TransactionKind::Withdrawal,
                    amount_minor,
                    description: &description,
                    reference_id: None,
                },
            )
            .await
        })?;
        self.notify_all(notify::wallet_movement(
            account_id,
            "Withdrawal Processed",
            format!(
                "{} was withdrawn from your wallet.",
                Money::new(amount_minor)
            ),
        ))
        .await;
        Ok(tx)
    }

    /// Admin credit back to an account, e.g. for a cancelled request.
    ///
    /// Authorization: admin only.
    pub async fn refund(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
        amount_minor: i64,
        reason: &str,
        reference_id: Option<Uuid>,
    ) -> ResultEngine<Transaction> {
        require_positive(amount_minor, "amount_minor")?;
        let reason = normalize_required_text(reason, "reason")?;
        let tx = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let target = self.require_account(&db_tx, account_id).await?;
            if target.role == AccountRole::Platform {
                return Err(EngineError::Validation(
                    "refunds cannot target the platform account".to_string(),
                ));
            }
            self.post_ledger_entry(
                &db_tx,
                LedgerPosting {
                    account_id,
                    kind: TransactionKind::Refund,
                    amount_minor,
                    description: &format!("Refund: {reason}"),
                    reference_id,
                },
            )
            .await
        })?;
        self.notify_all(notify::wallet_movement(
            account_id,
            "Refund Issued",
            format!(
                "{} was refunded to your wallet: {reason}",
                Money::new(amount_minor)
            ),
        ))
        .await;
        Ok(tx)
    }

    /// Ledger rows in `seq` order (oldest first).
    pub async fn ledger_transactions(&self, account_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        self.require_account(&self.database, account_id).await?;
        ledger::Entity::find()
            .filter(ledger::Column::AccountId.eq(account_id))
            .order_by_asc(ledger::Column::Seq)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Balance plus transactions, newest first.
    pub async fn wallet_details(&self, account_id: Uuid) -> ResultEngine<WalletDetails> {
        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id).await?;
            let transactions = ledger::Entity::find()
                .filter(ledger::Column::AccountId.eq(account_id))
                .order_by_desc(ledger::Column::Seq)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(WalletDetails {
                account_id,
                balance: account.balance,
                transactions,
            })
        })
    }

    /// Replays the account's ledger from zero and compares it with every
    /// stored snapshot and the stored balance.
    pub async fn verify_ledger(&self, account_id: Uuid) -> ResultEngine<LedgerAudit> {
        let (balance, log) = with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id).await?;
            let log = ledger::Entity::find()
                .filter(ledger::Column::AccountId.eq(account_id))
                .order_by_asc(ledger::Column::Seq)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok::<_, EngineError>((account.balance, log))
        })?;
        let audit = ledger::audit_log(account_id, balance, &log);
        if !audit.is_consistent() {
            tracing::error!(
                %account_id,
                stored = audit.stored_balance,
                replayed = audit.replayed_balance,
                mismatched = audit.mismatched.len(),
                "ledger audit failed"
            );
        }
        Ok(audit)
    }

    /// Everything the platform has earned so far.
    pub async fn platform_commission_balance(&self) -> ResultEngine<i64> {
        self.balance(self.platform_account_id).await
    }
}

fn last_four(account_number: &str) -> &str {
    let len = account_number.len();
    account_number.get(len.saturating_sub(4)..).unwrap_or(account_number)
}

//! Wallet API endpoints

use api_types::wallet::{Deposit, Refund, Withdraw};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Account, LedgerAudit, Transaction, WalletDetails};

use crate::{ServerError, server::ServerState};

/// Balance and transactions of the acting account, newest first.
pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<WalletDetails>, ServerError> {
    Ok(Json(state.engine.wallet_details(actor.id).await?))
}

/// Handle requests for topping up the acting account
pub async fn deposit(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<Deposit>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let tx = state
        .engine
        .deposit(actor.id, payload.amount_minor)
        .await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn withdraw(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<Withdraw>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let description = payload
        .description
        .unwrap_or_else(|| "Withdrawal".to_string());
    let tx = state
        .engine
        .withdraw(
            actor.id,
            payload.amount_minor,
            payload.bank_account_id,
            &description,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn refund(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<Refund>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let tx = state
        .engine
        .refund(
            actor.id,
            payload.account_id,
            payload.amount_minor,
            &payload.reason,
            payload.reference_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn audit(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<LedgerAudit>, ServerError> {
    Ok(Json(state.engine.verify_ledger(actor.id).await?))
}

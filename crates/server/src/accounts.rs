//! Account, agent and bank account endpoints

use api_types::{
    account::{AccountNew, AgentList, Availability},
    bank::BankAccountNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Account, AccountRole, BankAccount, EngineError};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{map_role, require_admin},
    server::ServerState,
};

/// Handle requests for registering a new account. Admins only.
pub async fn account_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<Account>), ServerError> {
    require_admin(&actor)?;
    let account = state
        .engine
        .create_account(map_role(payload.role), &payload.display_name)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, ServerError> {
    if actor.id != id && actor.role != AccountRole::Admin {
        return Err(EngineError::Forbidden("not your account".to_string()).into());
    }

    Ok(Json(state.engine.account(id).await?))
}

pub async fn agents(
    State(state): State<ServerState>,
    Query(query): Query<AgentList>,
) -> Result<Json<Vec<Account>>, ServerError> {
    let agents = state
        .engine
        .agents(query.available.unwrap_or(false))
        .await?;

    Ok(Json(agents))
}

pub async fn set_availability(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Availability>,
) -> Result<Json<Account>, ServerError> {
    let agent = state
        .engine
        .set_agent_availability(actor.id, id, payload.is_available)
        .await?;

    Ok(Json(agent))
}

pub async fn bank_accounts(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BankAccount>>, ServerError> {
    Ok(Json(state.engine.bank_accounts(actor.id).await?))
}

pub async fn bank_account_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<BankAccountNew>,
) -> Result<(StatusCode, Json<BankAccount>), ServerError> {
    let bank = state
        .engine
        .add_bank_account(
            actor.id,
            &payload.account_number,
            &payload.ifsc,
            &payload.holder_name,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(bank)))
}

pub async fn bank_account_remove(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_bank_account(actor.id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

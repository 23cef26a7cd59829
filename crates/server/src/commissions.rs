//! Commission approval endpoints

use api_types::{
    commission::{CommissionEntryView, CommissionSummary},
    task::{Remark, RemarkRequired},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{Account, Settlement, Task};
use uuid::Uuid;

use crate::{ServerError, convert::require_admin, server::ServerState};

/// Approve and settle. A failed payout leaves the task untouched (503).
pub async fn approve(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<Remark>>,
) -> Result<Json<Settlement>, ServerError> {
    let remark = payload.and_then(|Json(payload)| payload.remark);
    let settlement = state
        .engine
        .approve_commission(actor.id, id, remark.as_deref())
        .await?;

    Ok(Json(settlement))
}

pub async fn reject(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemarkRequired>,
) -> Result<Json<Task>, ServerError> {
    let task = state
        .engine
        .reject_commission(actor.id, id, &payload.remark)
        .await?;

    Ok(Json(task))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<CommissionSummary>, ServerError> {
    require_admin(&actor)?;

    let entries = state
        .engine
        .commission_entries()
        .await?
        .into_iter()
        .map(|entry| CommissionEntryView {
            task_id: entry.task_id,
            service_name: entry.service_name,
            admin_share: entry.admin_share,
            assigned_share: entry.assigned_share,
            generating_share: entry.generating_share,
            recorded_at: entry.recorded_at,
        })
        .collect();

    Ok(Json(CommissionSummary {
        platform_balance_minor: state.engine.platform_commission_balance().await?,
        entries,
    }))
}

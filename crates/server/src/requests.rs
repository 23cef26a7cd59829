//! Booking, lead and request endpoints

use api_types::request::{BookingNew, LeadNew, ResetSummary};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    Account, AccountRole, BookingCmd, CreatedRequest, EngineError, LeadCmd, RequestDetails,
};
use uuid::Uuid;

use crate::{ServerError, convert::uploads, server::ServerState};

/// Handle requests for booking a service as the acting customer
pub async fn booking_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<BookingNew>,
) -> Result<(StatusCode, Json<CreatedRequest>), ServerError> {
    let cmd = BookingCmd::new(payload.service_id, actor.id).documents(uploads(payload.documents)?);
    let created = state.engine.create_booking(cmd).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handle requests for registering a lead as the acting agent
pub async fn lead_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<LeadNew>,
) -> Result<(StatusCode, Json<CreatedRequest>), ServerError> {
    let cmd = LeadCmd::new(
        payload.service_id,
        actor.id,
        payload.customer_name,
        payload.customer_phone,
    )
    .documents(uploads(payload.documents)?);
    let created = state.engine.create_lead(cmd).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestDetails>, ServerError> {
    let details = state.engine.request(id).await?;

    let allowed = actor.role == AccountRole::Admin
        || details.request.requestor_id == actor.id
        || details.request.generated_by == Some(actor.id);
    let allowed = match (allowed, details.task_id) {
        (false, Some(task_id)) => state.engine.task(task_id).await?.task.involves(actor.id),
        (allowed, _) => allowed,
    };
    if !allowed {
        return Err(EngineError::Forbidden("request belongs to another account".to_string()).into());
    }

    Ok(Json(details))
}

/// Remove every request, task, document and history entry. Ledgers stay.
pub async fn reset(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<ResetSummary>, ServerError> {
    let summary = state.engine.purge_requests(actor.id).await?;

    Ok(Json(ResetSummary {
        requests: summary.requests,
        tasks: summary.tasks,
        documents: summary.documents,
        history_entries: summary.history_entries,
    }))
}

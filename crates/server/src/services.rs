//! Service catalog endpoints

use api_types::service::{ServiceNew, ServiceUpdate};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Account, Service};

use crate::{ServerError, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Service>>, ServerError> {
    Ok(Json(state.engine.services().await?))
}

pub async fn service_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<ServiceNew>,
) -> Result<(StatusCode, Json<Service>), ServerError> {
    let service = state
        .engine
        .add_service(
            actor.id,
            &payload.name,
            &payload.category,
            payload.fee_minor,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(service)))
}

/// Fee changes apply to requests created afterwards only.
pub async fn update(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ServiceUpdate>,
) -> Result<Json<Service>, ServerError> {
    let update = engine::ServiceUpdate {
        name: payload.name,
        category: payload.category,
        fee_minor: payload.fee_minor,
    };
    let service = state.engine.update_service(actor.id, &id, update).await?;

    Ok(Json(service))
}

pub async fn remove(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_service(actor.id, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

//! Task lifecycle endpoints

use api_types::task::{Ack, Assign, Complete, Remark, RemarkRequired, SupplyDocs, TaskList};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{Account, AccountRole, EngineError, SupplyDocsCmd, Task, TaskDetails, TaskFilter};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{map_status, uploads},
    server::ServerState,
};

/// List tasks.
///
/// Admins see every task; agents only the ones assigned to them.
pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<TaskList>,
) -> Result<Json<Vec<Task>>, ServerError> {
    let mut filter = TaskFilter::default();
    if let Some(status) = query.status {
        filter = filter.status(map_status(status));
    }

    match actor.role {
        AccountRole::Admin => {
            if let Some(agent_id) = query.assigned_agent_id {
                filter = filter.assigned_to(agent_id);
            }
        }
        AccountRole::Agent => {
            if query.assigned_agent_id.is_some_and(|id| id != actor.id) {
                return Err(
                    EngineError::Forbidden("agents can only list their own tasks".to_string())
                        .into(),
                );
            }
            filter = filter.assigned_to(actor.id);
        }
        AccountRole::Customer | AccountRole::Platform => {
            return Err(EngineError::Forbidden("task queue is for staff".to_string()).into());
        }
    }

    Ok(Json(state.engine.tasks(filter).await?))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskDetails>, ServerError> {
    let details = state.engine.task(id).await?;
    if actor.role != AccountRole::Admin && !details.task.involves(actor.id) {
        return Err(EngineError::Forbidden("task belongs to another account".to_string()).into());
    }

    Ok(Json(details))
}

pub async fn assign(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Assign>,
) -> Result<Json<Task>, ServerError> {
    let task = state
        .engine
        .assign_task(actor.id, id, payload.agent_id)
        .await?;

    Ok(Json(task))
}

pub async fn accept(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<Remark>>,
) -> Result<Json<Task>, ServerError> {
    let remark = payload.and_then(|Json(payload)| payload.remark);
    let task = state
        .engine
        .accept_task(actor.id, id, remark.as_deref())
        .await?;

    Ok(Json(task))
}

pub async fn reject(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemarkRequired>,
) -> Result<Json<Task>, ServerError> {
    let task = state
        .engine
        .reject_task(actor.id, id, &payload.remark)
        .await?;

    Ok(Json(task))
}

pub async fn request_docs(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemarkRequired>,
) -> Result<Json<Task>, ServerError> {
    let task = state
        .engine
        .request_documents(actor.id, id, &payload.remark)
        .await?;

    Ok(Json(task))
}

pub async fn supply_docs(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplyDocs>,
) -> Result<Json<Task>, ServerError> {
    let mut cmd = SupplyDocsCmd::new(id, actor.id, map_status(payload.resume_at))
        .documents(uploads(payload.documents)?);
    if let Some(remark) = payload.remark {
        cmd = cmd.remark(remark);
    }
    let task = state.engine.supply_documents(cmd).await?;

    Ok(Json(task))
}

pub async fn ack(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Ack>,
) -> Result<Json<Task>, ServerError> {
    let task = state
        .engine
        .submit_ack(
            actor.id,
            id,
            &payload.ack_number,
            payload.remark.as_deref(),
        )
        .await?;

    Ok(Json(task))
}

pub async fn complete(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Complete>,
) -> Result<Json<Task>, ServerError> {
    let proof = uploads(payload.proof)?;
    let task = state
        .engine
        .complete_task(actor.id, id, proof, payload.remark.as_deref())
        .await?;

    Ok(Json(task))
}

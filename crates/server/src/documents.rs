//! Document download endpoint

use api_types::document::{DocumentContent, DocumentQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::Account;

use crate::{ServerError, convert::encode, server::ServerState};

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<DocumentContent>, ServerError> {
    let bytes = state
        .engine
        .download_document(actor.id, &query.path)
        .await?;

    Ok(Json(DocumentContent {
        content_base64: encode(&bytes),
        path: query.path,
    }))
}

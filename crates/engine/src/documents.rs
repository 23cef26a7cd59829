//! Document metadata recorded against a service request.
//!
//! The bytes live in the [`DocumentStore`](crate::DocumentStore); this table
//! only keeps what the store returned.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoredDocument;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub request_id: Uuid,
    pub name: String,
    pub size: i64,
    pub mime: String,
    pub path: String,
    /// Uploaded by the agent as completion proof.
    pub is_proof: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub(crate) fn from_stored(
        request_id: Uuid,
        stored: StoredDocument,
        is_proof: bool,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            name: stored.name,
            size: stored.size,
            mime: stored.mime,
            path: stored.path,
            is_proof,
            uploaded_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub name: String,
    pub size: i64,
    pub mime: String,
    pub path: String,
    pub is_proof: bool,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::requests::Entity",
        from = "Column::RequestId",
        to = "super::requests::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Requests,
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Document> for ActiveModel {
    fn from(doc: &Document) -> Self {
        Self {
            id: ActiveValue::Set(doc.id),
            request_id: ActiveValue::Set(doc.request_id),
            name: ActiveValue::Set(doc.name.clone()),
            size: ActiveValue::Set(doc.size),
            mime: ActiveValue::Set(doc.mime.clone()),
            path: ActiveValue::Set(doc.path.clone()),
            is_proof: ActiveValue::Set(doc.is_proof),
            uploaded_at: ActiveValue::Set(doc.uploaded_at),
        }
    }
}

impl From<Model> for Document {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            request_id: model.request_id,
            name: model.name,
            size: model.size,
            mime: model.mime,
            path: model.path,
            is_proof: model.is_proof,
            uploaded_at: model.uploaded_at,
        }
    }
}

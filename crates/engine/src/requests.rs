//! Service requests: bookings and leads.
//!
//! Both kinds share one table. A lead carries `generated_by` and the
//! customer's contact fields; a booking has the customer as requestor.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Document, EngineError, HistoryEntry, OriginKind, TaskStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub kind: OriginKind,
    pub service_id: String,
    pub service_name: String,
    /// Fixed from the catalog at creation; never updated.
    pub fee_minor: i64,
    /// Account that paid the fee.
    pub requestor_id: Uuid,
    pub generated_by: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Mirrors the status of the task derived from this request.
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDetails {
    pub request: ServiceRequest,
    pub task_id: Option<Uuid>,
    pub documents: Vec<Document>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub service_id: String,
    pub service_name: String,
    pub fee_minor: i64,
    pub requestor_id: Uuid,
    pub generated_by: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::tasks::Entity")]
    Tasks,
    #[sea_orm(has_many = "super::documents::Entity")]
    Documents,
}

impl Related<super::tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ServiceRequest> for ActiveModel {
    fn from(request: &ServiceRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id),
            kind: ActiveValue::Set(request.kind.as_str().to_string()),
            service_id: ActiveValue::Set(request.service_id.clone()),
            service_name: ActiveValue::Set(request.service_name.clone()),
            fee_minor: ActiveValue::Set(request.fee_minor),
            requestor_id: ActiveValue::Set(request.requestor_id),
            generated_by: ActiveValue::Set(request.generated_by),
            customer_name: ActiveValue::Set(request.customer_name.clone()),
            customer_phone: ActiveValue::Set(request.customer_phone.clone()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            created_at: ActiveValue::Set(request.created_at),
        }
    }
}

impl TryFrom<Model> for ServiceRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            kind: OriginKind::try_from(model.kind.as_str())?,
            service_id: model.service_id,
            service_name: model.service_name,
            fee_minor: model.fee_minor,
            requestor_id: model.requestor_id,
            generated_by: model.generated_by,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            status: TaskStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}

//! Append-only status history.
//!
//! The same entry is written twice per transition: once under the task id and
//! once under the originating request id, so either side reads its own
//! timeline without a join.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TaskStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: TaskStatus,
    pub remark: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "history_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Task or service request id.
    pub subject_id: Uuid,
    pub seq: i64,
    pub status: String,
    pub remark: String,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn for_subject(subject_id: Uuid, seq: i64, entry: &HistoryEntry) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4()),
            subject_id: ActiveValue::Set(subject_id),
            seq: ActiveValue::Set(seq),
            status: ActiveValue::Set(entry.status.as_str().to_string()),
            remark: ActiveValue::Set(entry.remark.clone()),
            recorded_at: ActiveValue::Set(entry.recorded_at),
        }
    }
}

impl TryFrom<Model> for HistoryEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            status: TaskStatus::try_from(model.status.as_str())?,
            remark: model.remark,
            recorded_at: model.recorded_at,
        })
    }
}

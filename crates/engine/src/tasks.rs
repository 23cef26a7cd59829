//! Tasks and their lifecycle.
//!
//! A [`Task`] wraps exactly one service request and moves through the states
//! of [`TaskStatus`]. Every legal move is listed once, in
//! [`TaskStatus::next`]; operations never compare status strings themselves.
//!
//! ```text
//! pending_assignment(0) --assign--> assigned(1) --accept--> accepted(2)
//! accepted(2) --request-docs--> additional-docs-vle(2) --supply-docs--> accepted(2)
//! accepted(2) --submit-ack--> ack-submitted(3)
//! ack-submitted(3) --request-docs--> additional-docs-dept(3) --supply-docs--> ack-submitted(3)
//! ack-submitted(3) --complete--> pending_commission_approval(4)
//! pending_commission_approval(4) --approve--> commission_approved(5)
//! pending_commission_approval(4) --reject-commission--> commission_rejected(4)
//! phases 1..=3 --reject--> pending_assignment(0)
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Document, EngineError, HistoryEntry, ResultEngine};

/// How the originating request came in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    /// Created by a customer for themselves.
    Booking,
    /// Created (and prepaid) by an agent for a customer without an account.
    Lead,
}

impl OriginKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Lead => "lead",
        }
    }
}

impl TryFrom<&str> for OriginKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "booking" => Ok(Self::Booking),
            "lead" => Ok(Self::Lead),
            other => Err(EngineError::Validation(format!("invalid origin kind: {other}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "pending_assignment")]
    PendingAssignment,
    #[serde(rename = "assigned")]
    Assigned,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "additional-docs-vle")]
    AdditionalDocsVle,
    #[serde(rename = "ack-submitted")]
    AckSubmitted,
    #[serde(rename = "additional-docs-dept")]
    AdditionalDocsDept,
    #[serde(rename = "pending_commission_approval")]
    PendingCommissionApproval,
    #[serde(rename = "commission_approved")]
    CommissionApproved,
    #[serde(rename = "commission_rejected")]
    CommissionRejected,
}

/// Operations that move a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskAction {
    Assign,
    Accept,
    Reject,
    RequestDocuments,
    /// Documents arrived; resume at the given status.
    SupplyDocuments(TaskStatus),
    SubmitAck,
    Complete,
    ApproveCommission,
    RejectCommission,
}

impl TaskAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::RequestDocuments => "request-docs",
            Self::SupplyDocuments(_) => "supply-docs",
            Self::SubmitAck => "submit-ack",
            Self::Complete => "complete",
            Self::ApproveCommission => "approve-commission",
            Self::RejectCommission => "reject-commission",
        }
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 9] = [
        Self::PendingAssignment,
        Self::Assigned,
        Self::Accepted,
        Self::AdditionalDocsVle,
        Self::AckSubmitted,
        Self::AdditionalDocsDept,
        Self::PendingCommissionApproval,
        Self::CommissionApproved,
        Self::CommissionRejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingAssignment => "pending_assignment",
            Self::Assigned => "assigned",
            Self::Accepted => "accepted",
            Self::AdditionalDocsVle => "additional-docs-vle",
            Self::AckSubmitted => "ack-submitted",
            Self::AdditionalDocsDept => "additional-docs-dept",
            Self::PendingCommissionApproval => "pending_commission_approval",
            Self::CommissionApproved => "commission_approved",
            Self::CommissionRejected => "commission_rejected",
        }
    }

    pub fn phase(self) -> i32 {
        match self {
            Self::PendingAssignment => 0,
            Self::Assigned => 1,
            Self::Accepted | Self::AdditionalDocsVle => 2,
            Self::AckSubmitted | Self::AdditionalDocsDept => 3,
            Self::PendingCommissionApproval | Self::CommissionRejected => 4,
            Self::CommissionApproved => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CommissionApproved | Self::CommissionRejected)
    }

    /// The status reached by applying `action`, or `InvalidTransition`.
    pub fn next(self, action: TaskAction) -> ResultEngine<TaskStatus> {
        use TaskAction as A;
        use TaskStatus as S;

        let next = match (self, action) {
            (S::PendingAssignment, A::Assign) => Some(S::Assigned),
            (S::Assigned, A::Accept) => Some(S::Accepted),
            (
                S::Assigned | S::Accepted | S::AdditionalDocsVle | S::AckSubmitted
                | S::AdditionalDocsDept,
                A::Reject,
            ) => Some(S::PendingAssignment),
            (S::Accepted, A::RequestDocuments) => Some(S::AdditionalDocsVle),
            (S::AckSubmitted, A::RequestDocuments) => Some(S::AdditionalDocsDept),
            (S::AdditionalDocsVle | S::AdditionalDocsDept, A::SupplyDocuments(target))
                if matches!(target, S::Accepted | S::AckSubmitted)
                    && target.phase() == self.phase() =>
            {
                Some(target)
            }
            (S::Accepted, A::SubmitAck) => Some(S::AckSubmitted),
            (S::AckSubmitted, A::Complete) => Some(S::PendingCommissionApproval),
            (S::PendingCommissionApproval, A::ApproveCommission) => Some(S::CommissionApproved),
            (S::PendingCommissionApproval, A::RejectCommission) => Some(S::CommissionRejected),
            _ => None,
        };

        next.ok_or_else(|| match action {
            A::SupplyDocuments(target) => EngineError::InvalidTransition(format!(
                "cannot resume at {target} from {self}"
            )),
            _ => EngineError::InvalidTransition(format!(
                "cannot {} a task in status {self}",
                action.as_str()
            )),
        })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| EngineError::Validation(format!("invalid task status: {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub origin_kind: OriginKind,
    pub origin_id: Uuid,
    pub service_id: String,
    pub service_name: String,
    pub fee_minor: i64,
    pub assigned_agent_id: Option<Uuid>,
    pub generated_by: Option<Uuid>,
    pub requestor_id: Uuid,
    pub phase: i32,
    pub status: TaskStatus,
    pub ack_number: Option<String>,
    /// Bumped on every mutation; writes are conditional on it.
    pub revision: i64,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether `account_id` is the requestor, the generating agent or the
    /// assigned agent.
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.requestor_id == account_id
            || self.generated_by == Some(account_id)
            || self.assigned_agent_id == Some(account_id)
    }
}

/// A task together with the documents and history of its origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    pub task: Task,
    pub documents: Vec<Document>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub origin_kind: String,
    #[sea_orm(unique)]
    pub origin_id: Uuid,
    pub service_id: String,
    pub service_name: String,
    pub fee_minor: i64,
    pub assigned_agent_id: Option<Uuid>,
    pub generated_by: Option<Uuid>,
    pub requestor_id: Uuid,
    pub phase: i32,
    pub status: String,
    pub ack_number: Option<String>,
    pub revision: i64,
    pub assigned_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::requests::Entity",
        from = "Column::OriginId",
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

impl From<&Task> for ActiveModel {
    fn from(task: &Task) -> Self {
        Self {
            id: ActiveValue::Set(task.id),
            origin_kind: ActiveValue::Set(task.origin_kind.as_str().to_string()),
            origin_id: ActiveValue::Set(task.origin_id),
            service_id: ActiveValue::Set(task.service_id.clone()),
            service_name: ActiveValue::Set(task.service_name.clone()),
            fee_minor: ActiveValue::Set(task.fee_minor),
            assigned_agent_id: ActiveValue::Set(task.assigned_agent_id),
            generated_by: ActiveValue::Set(task.generated_by),
            requestor_id: ActiveValue::Set(task.requestor_id),
            phase: ActiveValue::Set(task.phase),
            status: ActiveValue::Set(task.status.as_str().to_string()),
            ack_number: ActiveValue::Set(task.ack_number.clone()),
            revision: ActiveValue::Set(task.revision),
            assigned_at: ActiveValue::Set(task.assigned_at),
            created_at: ActiveValue::Set(task.created_at),
            updated_at: ActiveValue::Set(task.updated_at),
        }
    }
}

impl TryFrom<Model> for Task {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            origin_kind: OriginKind::try_from(model.origin_kind.as_str())?,
            origin_id: model.origin_id,
            service_id: model.service_id,
            service_name: model.service_name,
            fee_minor: model.fee_minor,
            assigned_agent_id: model.assigned_agent_id,
            generated_by: model.generated_by,
            requestor_id: model.requestor_id,
            phase: model.phase,
            status: TaskStatus::try_from(model.status.as_str())?,
            ack_number: model.ack_number,
            revision: model.revision,
            assigned_at: model.assigned_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use TaskAction as A;
    use TaskStatus as S;

    #[test]
    fn happy_path_walks_every_phase() {
        let mut status = S::PendingAssignment;
        let mut phases = vec![status.phase()];
        for action in [
            A::Assign,
            A::Accept,
            A::SubmitAck,
            A::Complete,
            A::ApproveCommission,
        ] {
            status = status.next(action).unwrap();
            phases.push(status.phase());
        }
        assert_eq!(status, S::CommissionApproved);
        assert_eq!(phases, vec![0, 1, 2, 3, 4, 5]);
        assert!(status.is_terminal());
    }

    #[test]
    fn reject_is_allowed_from_phase_one_to_three_only() {
        for status in S::ALL {
            let allowed = (1..=3).contains(&status.phase());
            assert_eq!(
                status.next(A::Reject).is_ok(),
                allowed,
                "reject from {status}"
            );
        }
    }

    #[test]
    fn request_docs_keeps_phase() {
        let vle = S::Accepted.next(A::RequestDocuments).unwrap();
        assert_eq!(vle, S::AdditionalDocsVle);
        assert_eq!(vle.phase(), S::Accepted.phase());

        let dept = S::AckSubmitted.next(A::RequestDocuments).unwrap();
        assert_eq!(dept, S::AdditionalDocsDept);
        assert_eq!(dept.phase(), 3);
    }

    #[test]
    fn supply_docs_resumes_only_at_matching_phase() {
        assert_eq!(
            S::AdditionalDocsVle
                .next(A::SupplyDocuments(S::Accepted))
                .unwrap(),
            S::Accepted
        );
        assert_eq!(
            S::AdditionalDocsDept
                .next(A::SupplyDocuments(S::AckSubmitted))
                .unwrap(),
            S::AckSubmitted
        );
        assert!(
            S::AdditionalDocsVle
                .next(A::SupplyDocuments(S::AckSubmitted))
                .is_err()
        );
        assert!(
            S::AdditionalDocsDept
                .next(A::SupplyDocuments(S::PendingCommissionApproval))
                .is_err()
        );
        assert!(S::Accepted.next(A::SupplyDocuments(S::Accepted)).is_err());
    }

    #[test]
    fn commission_decisions_are_final() {
        for terminal in [S::CommissionApproved, S::CommissionRejected] {
            assert!(matches!(
                terminal.next(A::ApproveCommission),
                Err(EngineError::InvalidTransition(_))
            ));
            assert!(terminal.next(A::RejectCommission).is_err());
            assert!(terminal.next(A::Assign).is_err());
        }
    }

    #[test]
    fn assign_only_from_pending() {
        for status in S::ALL {
            assert_eq!(
                status.next(A::Assign).is_ok(),
                status == S::PendingAssignment
            );
        }
    }

    #[test]
    fn storage_names_round_trip() {
        for status in S::ALL {
            assert_eq!(S::try_from(status.as_str()).unwrap(), status);
        }
        assert!(S::try_from("rejected").is_err());
    }
}

//! Fee splits and the commission ledger.
//!
//! The percentages are fixed in basis points. The admin share is never
//! computed directly: it is whatever is left of the fee after the agent
//! shares, so the three parts always add up to the fee.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Money, Task};

/// Assigned agent's share on a booking (or a lead without a distinct generator).
pub const SOLE_AGENT_SHARE_BPS: u16 = 9_000;
/// Each agent's share when a lead is generated by one agent and fulfilled by another.
pub const LEAD_AGENT_SHARE_BPS: u16 = 4_500;
/// Nominal platform share; the platform also absorbs rounding.
pub const ADMIN_SHARE_BPS: u16 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub admin_share: i64,
    pub assigned_share: i64,
    pub generating_share: i64,
}

impl CommissionSplit {
    /// Splits `fee_minor` between the assigned agent, the generating agent
    /// and the platform.
    ///
    /// The 45/45/10 rule applies only when a generating agent exists and is
    /// someone other than the assignee; everything else pays 90/0/10.
    pub fn compute(fee_minor: i64, assigned: Option<Uuid>, generated_by: Option<Uuid>) -> Self {
        let fee = Money::new(fee_minor);
        let distinct_generator = matches!(generated_by, Some(g) if Some(g) != assigned);

        let (assigned_share, generating_share) = match (assigned, distinct_generator) {
            (Some(_), true) => (
                fee.share_bps(LEAD_AGENT_SHARE_BPS),
                fee.share_bps(LEAD_AGENT_SHARE_BPS),
            ),
            (Some(_), false) => (fee.share_bps(SOLE_AGENT_SHARE_BPS), Money::ZERO),
            (None, true) => (Money::ZERO, fee.share_bps(LEAD_AGENT_SHARE_BPS)),
            (None, false) => (Money::ZERO, Money::ZERO),
        };

        Self {
            admin_share: (fee - assigned_share - generating_share).minor(),
            assigned_share: assigned_share.minor(),
            generating_share: generating_share.minor(),
        }
    }

    pub fn for_task(task: &Task) -> Self {
        Self::compute(task.fee_minor, task.assigned_agent_id, task.generated_by)
    }

    pub fn total(&self) -> i64 {
        self.admin_share + self.assigned_share + self.generating_share
    }
}

/// One row per settled task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub service_name: String,
    pub admin_share: i64,
    pub assigned_share: i64,
    pub generating_share: i64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commission_ledger")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub task_id: Uuid,
    pub service_name: String,
    pub admin_share: i64,
    pub assigned_share: i64,
    pub generating_share: i64,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CommissionEntry> for ActiveModel {
    fn from(entry: &CommissionEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            task_id: ActiveValue::Set(entry.task_id),
            service_name: ActiveValue::Set(entry.service_name.clone()),
            admin_share: ActiveValue::Set(entry.admin_share),
            assigned_share: ActiveValue::Set(entry.assigned_share),
            generating_share: ActiveValue::Set(entry.generating_share),
            recorded_at: ActiveValue::Set(entry.recorded_at),
        }
    }
}

impl From<Model> for CommissionEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            service_name: model.service_name,
            admin_share: model.admin_share,
            assigned_share: model.assigned_share,
            generating_share: model.generating_share,
            recorded_at: model.recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_pays_ninety_ten() {
        let agent = Uuid::new_v4();
        let split = CommissionSplit::compute(1000, Some(agent), None);
        assert_eq!(split.assigned_share, 900);
        assert_eq!(split.generating_share, 0);
        assert_eq!(split.admin_share, 100);
    }

    #[test]
    fn lead_with_distinct_generator_pays_forty_five_each() {
        let split = CommissionSplit::compute(1000, Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        assert_eq!(split.assigned_share, 450);
        assert_eq!(split.generating_share, 450);
        assert_eq!(split.admin_share, 100);
    }

    #[test]
    fn generator_fulfilling_own_lead_is_paid_once() {
        let agent = Uuid::new_v4();
        let split = CommissionSplit::compute(1000, Some(agent), Some(agent));
        assert_eq!(split.assigned_share, 900);
        assert_eq!(split.generating_share, 0);
    }

    #[test]
    fn remainder_goes_to_admin() {
        for fee in [0, 1, 7, 33, 999, 1001, 12_345] {
            for generator in [None, Some(Uuid::new_v4())] {
                let split = CommissionSplit::compute(fee, Some(Uuid::new_v4()), generator);
                assert_eq!(split.total(), fee, "fee {fee}");
                assert!(split.admin_share >= 0);
            }
        }
        let split = CommissionSplit::compute(7, Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        assert_eq!((split.assigned_share, split.generating_share), (3, 3));
        assert_eq!(split.admin_share, 1);
    }

    #[test]
    fn fees_near_the_integer_limit_still_split() {
        let split = CommissionSplit::compute(i64::MAX, Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        assert_eq!(split.total(), i64::MAX);
        assert!(split.admin_share > 0);
    }
}

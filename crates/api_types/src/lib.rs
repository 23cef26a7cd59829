use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountRole {
        Customer,
        Agent,
        Admin,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub role: AccountRole,
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AgentList {
        /// Only agents currently accepting work.
        pub available: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Availability {
        pub is_available: bool,
    }
}

pub mod bank {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankAccountNew {
        pub account_number: String,
        pub ifsc: String,
        pub holder_name: String,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Deposit {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Withdraw {
        pub amount_minor: i64,
        pub bank_account_id: Uuid,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Refund {
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub reason: String,
        /// Task or request the refund relates to.
        pub reference_id: Option<Uuid>,
    }
}

pub mod service {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceNew {
        pub name: String,
        pub category: String,
        pub fee_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ServiceUpdate {
        pub name: Option<String>,
        pub category: Option<String>,
        pub fee_minor: Option<i64>,
    }
}

pub mod document {
    use super::*;

    /// A file travelling inside a JSON body.
    ///
    /// `content_base64` uses the standard alphabet with padding.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct DocumentPayload {
        pub name: String,
        pub mime: String,
        pub content_base64: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DocumentQuery {
        pub path: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DocumentContent {
        pub path: String,
        pub content_base64: String,
    }
}

pub mod request {
    use super::{document::DocumentPayload, *};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingNew {
        pub service_id: String,
        #[serde(default)]
        pub documents: Vec<DocumentPayload>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeadNew {
        pub service_id: String,
        pub customer_name: String,
        pub customer_phone: String,
        #[serde(default)]
        pub documents: Vec<DocumentPayload>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResetSummary {
        pub requests: u64,
        pub tasks: u64,
        pub documents: u64,
        pub history_entries: u64,
    }
}

pub mod task {
    use super::{document::DocumentPayload, *};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TaskList {
        pub status: Option<TaskStatus>,
        pub assigned_agent_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Assign {
        pub agent_id: Uuid,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Remark {
        pub remark: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RemarkRequired {
        pub remark: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SupplyDocs {
        /// Status to resume at: `accepted` or `ack-submitted`.
        pub resume_at: TaskStatus,
        pub documents: Vec<DocumentPayload>,
        pub remark: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Ack {
        pub ack_number: String,
        pub remark: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Complete {
        pub proof: Vec<DocumentPayload>,
        pub remark: Option<String>,
    }
}

pub mod commission {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CommissionEntryView {
        pub task_id: Uuid,
        pub service_name: String,
        pub admin_share: i64,
        pub assigned_share: i64,
        pub generating_share: i64,
        pub recorded_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CommissionSummary {
        pub platform_balance_minor: i64,
        pub entries: Vec<CommissionEntryView>,
    }
}

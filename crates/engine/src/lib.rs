//! Task lifecycle, wallet ledger and commission settlement.
//!
//! The [`Engine`] owns three concerns that must stay consistent with each
//! other:
//!
//! - per-account balances and their append-only ledger,
//! - service requests (bookings and leads) and the task derived from each,
//! - the settlement that splits a task's fee once an admin approves it.
//!
//! Everything is persisted through sea-orm; every operation that touches a
//! balance or a task status runs inside one database transaction.

pub use accounts::{Account, AccountRole};
pub use bank_accounts::BankAccount;
pub use collaborators::{
    CollaboratorError, DocumentStore, DocumentUpload, FsDocumentStore, Notification,
    NotificationSink, NotifyTarget, Severity, StoredDocument, TracingNotifier,
};
pub use commands::{BookingCmd, LeadCmd, ServiceUpdate, SupplyDocsCmd, TaskFilter};
pub use commission::{
    ADMIN_SHARE_BPS, CommissionEntry, CommissionSplit, LEAD_AGENT_SHARE_BPS,
    SOLE_AGENT_SHARE_BPS,
};
pub use documents::Document;
pub use error::EngineError;
pub use history::HistoryEntry;
pub use ledger::{LedgerAudit, Transaction, TransactionKind, WalletDetails};
pub use money::Money;
pub use ops::{CreatedRequest, Engine, EngineBuilder, PurgeSummary, Settlement};
pub use requests::{RequestDetails, ServiceRequest};
pub use services::{MAX_FEE_MINOR, Service};
pub use tasks::{OriginKind, Task, TaskAction, TaskDetails, TaskStatus};

pub mod accounts;
pub mod bank_accounts;
mod collaborators;
mod commands;
pub mod commission;
pub mod documents;
mod error;
pub mod history;
pub mod ledger;
mod money;
mod ops;
pub mod requests;
pub mod services;
pub mod tasks;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

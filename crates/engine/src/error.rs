//! The module contains the error the engine can throw.
//!
//! Every failure is returned to the caller as a typed [`EngineError`]; the
//! engine never swallows one, with the single exception of notification
//! delivery (see [`NotificationSink`]).
//!
//! - [`Validation`] a mandatory input (remark, ack number, proof) is missing.
//! - [`InvalidTransition`] the task status does not allow the operation.
//! - [`InsufficientFunds`] a debit or withdrawal exceeds the balance.
//! - [`KeyNotFound`] unknown task, account, request or service.
//! - [`SettlementFailure`] a payout credit failed; nothing was applied.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidTransition`]: EngineError::InvalidTransition
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`SettlementFailure`]: EngineError::SettlementFailure
//!  [`NotificationSink`]: crate::NotificationSink
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Assignment refused: {0}")]
    AssignmentConstraintViolated(String),
    #[error("Upload incomplete: {uploaded} of {expected} documents stored")]
    PartialUploadFailure { expected: usize, uploaded: usize },
    #[error("Settlement failed: {0}")]
    SettlementFailure(String),
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Whether retrying the same operation later may succeed.
    ///
    /// Nothing was applied when one of these is returned.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::SettlementFailure(_) => true,
            Self::Database(err) => matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_)),
            _ => false,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::AssignmentConstraintViolated(a), Self::AssignmentConstraintViolated(b)) => {
                a == b
            }
            (
                Self::PartialUploadFailure {
                    expected: e1,
                    uploaded: u1,
                },
                Self::PartialUploadFailure {
                    expected: e2,
                    uploaded: u2,
                },
            ) => e1 == e2 && u1 == u2,
            (Self::SettlementFailure(a), Self::SettlementFailure(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

// ================================================================
// File: nuqta-common/src/error.rs
// ================================================================

use thiserror::Error;

use crate::models::redemption::RedemptionStatus;
use crate::models::reward::RedeemBlock;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Invalid state transition: cannot {action} a redemption in status '{status}'")]
    InvalidStateTransition {
        status: RedemptionStatus,
        action: &'static str,
    },

    #[error("Not eligible to redeem: {0:?}")]
    NotEligible(Vec<RedeemBlock>),

    #[error("Already a member of this tenant")]
    DuplicateMembership,

    #[error("Tenant capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Uuid error: {0}")]
    Uuid(#[from] uuid::Error),
}

impl Error {
    /// True when the wrapped database error is a unique-constraint violation.
    /// Used by the code/hash generators that retry on collision.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }

    /// True for conditions caused by the caller (4xx territory), as opposed
    /// to store/infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::InsufficientPoints { .. }
                | Error::InvalidStateTransition { .. }
                | Error::NotEligible(_)
                | Error::DuplicateMembership
                | Error::CapacityExceeded(_)
        )
    }

    /// Stable machine-readable code for API layers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InsufficientPoints { .. } => "insufficient_points",
            Error::InvalidStateTransition { .. } => "invalid_state",
            Error::NotEligible(_) => "not_eligible",
            Error::DuplicateMembership => "duplicate_membership",
            Error::CapacityExceeded(_) => "capacity_exceeded",
            Error::ConcurrencyConflict(_) => "concurrency_conflict",
            _ => "internal_error",
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

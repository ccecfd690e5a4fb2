//! Lifecycle guards.
//!
//! Every guard takes the caller as an explicit `Actor` (or `None` when the
//! request is anonymous) plus the entity it is about to touch, and either
//! permits the operation or returns the reason it is refused. Guards do no
//! I/O; services load entities, run the guard, then persist.

pub mod response;
pub mod rfp;

use thiserror::Error;

use crate::response::ResponseStatus;
use crate::rfp::RfpStatus;
use crate::role::{Actor, Role};

pub type GuardResult<T> = Result<T, GuardError>;

/// Why a guard refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("unauthorized")]
    Unauthenticated,

    #[error("forbidden, wrong role: {required} role required")]
    WrongRole { required: Role },

    #[error("forbidden, not owner")]
    NotOwner,

    #[error("invalid state for operation: {operation} not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("validation failed: the RFP deadline has passed")]
    DeadlinePassed,

    #[error("You have already submitted a response to this RFP")]
    AlreadySubmitted,
}

impl GuardError {
    pub(crate) fn rfp_state(operation: &'static str, status: RfpStatus) -> Self {
        GuardError::InvalidState {
            operation,
            state: status.as_str().to_string(),
        }
    }

    pub(crate) fn response_state(operation: &'static str, status: ResponseStatus) -> Self {
        GuardError::InvalidState {
            operation,
            state: status.as_str().to_string(),
        }
    }

    /// Short machine-readable reason, used for metrics labels and error codes.
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::Unauthenticated => "unauthorized",
            GuardError::WrongRole { .. } => "wrong_role",
            GuardError::NotOwner => "not_owner",
            GuardError::InvalidState { .. } => "invalid_state",
            GuardError::NotFound(_) => "not_found",
            GuardError::Validation(_) => "validation_failed",
            GuardError::DeadlinePassed => "deadline_passed",
            GuardError::AlreadySubmitted => "already_submitted",
        }
    }
}

/// Require an authenticated caller.
pub fn require_actor(actor: Option<&Actor>) -> GuardResult<&Actor> {
    actor.ok_or(GuardError::Unauthenticated)
}

/// Require the caller to hold `role`.
pub fn require_role(actor: &Actor, role: Role) -> GuardResult<()> {
    if actor.role != role {
        return Err(GuardError::WrongRole { required: role });
    }
    Ok(())
}

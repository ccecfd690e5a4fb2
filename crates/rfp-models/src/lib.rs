//! Shared data models for the RFP backend.
//!
//! This crate provides Serde-serializable types for:
//! - RFPs and supplier responses with their status enums
//! - User profiles, roles and the explicit `Actor`
//! - Request schemas validated with `validator`
//! - Lifecycle guards (pure permission and state checks)
//! - Browse filtering and pagination

pub mod browse;
pub mod guard;
pub mod profile;
pub mod requests;
pub mod response;
pub mod rfp;
pub mod role;

// Re-export common types
pub use browse::{BrowseQuery, Page};
pub use guard::{GuardError, GuardResult};
pub use profile::Profile;
pub use requests::{
    AttachmentInput, CreateRfpRequest, OnboardProfileRequest, RejectResponseRequest,
    SubmitResponseRequest, UpdateRfpRequest,
};
pub use response::{ResponseId, ResponseStatus, RfpResponse};
pub use rfp::{Attachment, BudgetRange, Priority, Rfp, RfpId, RfpMetadata, RfpStatus};
pub use role::{Actor, Role};

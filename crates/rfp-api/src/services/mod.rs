//! Business logic services.
//!
//! Each mutating operation follows the same shape: load the entity with its
//! store version, run the lifecycle guard, apply the change to a local copy
//! and write it back conditionally. A lost race reloads once and re-runs the
//! guard so the caller sees the verdict on fresh state.

pub mod profile;
pub mod response;
pub mod rfp;

pub use profile::ProfileService;
pub use response::ResponseService;
pub use rfp::RfpService;

/// Conditional writes attempted before giving up on a contended entity.
const MAX_WRITE_ATTEMPTS: usize = 2;

#[cfg(test)]
pub(crate) mod test_support;

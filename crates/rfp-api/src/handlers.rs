//! Request handlers.

pub mod health;
pub mod profile;
pub mod responses;
pub mod rfps;

pub use health::*;
pub use profile::*;
pub use responses::*;
pub use rfps::*;

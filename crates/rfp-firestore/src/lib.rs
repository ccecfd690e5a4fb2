//! Firestore persistence for the RFP backend.
//!
//! This crate provides:
//! - A Firestore REST client (service account or emulator auth, read
//!   retries, atomic commits, structured queries)
//! - Typed repositories for RFPs, responses and profiles
//! - The `Store` trait seam with Firestore and in-memory implementations

pub mod client;
pub mod error;
pub mod firestore_store;
pub mod memory;
pub mod metrics;
pub mod profile_repo;
pub mod response_repo;
pub mod retry;
pub mod rfp_repo;
pub mod store;
pub mod token_cache;
pub mod types;


pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use firestore_store::FirestoreStore;
pub use memory::MemoryStore;
pub use profile_repo::ProfileRepository;
pub use response_repo::ResponseRepository;
pub use retry::RetryConfig;
pub use rfp_repo::RfpRepository;
pub use store::{ProfileStore, ResponseStore, RfpStore, Store, Versioned, BROWSE_SCAN_LIMIT};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

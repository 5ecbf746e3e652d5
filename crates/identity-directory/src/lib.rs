//! Identity directory for the Prism client.
//!
//! Reads attached identity records for the signed-in user or any address,
//! and the per-provider proof counts shown on the dashboard.

mod address;
mod client;
mod error;
mod records;

pub use address::{shorten_address, validate_address};
pub use client::DirectoryClient;
pub use error::{DirectoryError, DirectoryResult};
pub use records::{IdentityRecord, ProofStats, UserProfile};

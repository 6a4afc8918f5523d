//! `pharmachain-api` — HTTP client for the prescription backend.
//!
//! [`ApiClient`] fetches prescription and patient records;
//! [`VerificationClient`] asks the backend whether a prescription's data
//! hash matches what was anchored on the ledger.

pub mod error;
pub mod store;
pub mod types;
pub mod verify;

#[cfg(test)]
mod testing;

pub use error::{ApiError, Result};
pub use store::ApiClient;
pub use types::{Patient, Pharmacy, Prescription, VerificationOutcome};
pub use verify::VerificationClient;

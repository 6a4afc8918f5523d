//! `pharmachain-core` — types and helpers shared by every PharmaChain crate.
//!
//! Holds the configuration layer, the reminder data model (`ReminderSpec`,
//! `TimeOfDay`), identifier resolution for scanned or pasted input, and the
//! crate-wide error type.

pub mod config;
pub mod error;
pub mod ident;
pub mod reminder;
pub mod types;

pub use error::{CoreError, Result};
pub use ident::{resolve, resolve_with_marker, share_url, IdKind};
pub use reminder::{ReminderMessage, ReminderSpec, TimeOfDay};
pub use types::{CanonicalId, ScheduleId};

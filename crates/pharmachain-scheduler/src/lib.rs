//! `pharmachain-scheduler` — Tokio-based daily medicine reminders.
//!
//! # Overview
//!
//! [`ReminderScheduler::start`] turns a [`ReminderSpec`](pharmachain_core::ReminderSpec)
//! into one slot per listed time. Each slot sleeps until its next wall-clock
//! occurrence, delivers through a [`Notifier`](pharmachain_notify::Notifier),
//! and re-arms for the following day until stopped.
//!
//! # Slot lifecycle
//!
//! | State       | Meaning                                         |
//! |-------------|-------------------------------------------------|
//! | `Unarmed`   | Waiting for the permission request to resolve   |
//! | `Armed`     | Timer pending for `next_fire_at`                |
//! | `Fired`     | Timer elapsed, reminder being delivered         |
//! | `Cancelled` | Stopped; never fires again                      |

pub mod clock;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod types;

pub use clock::{AnchoredClock, Clock, SystemClock};
pub use engine::{ReminderScheduler, ScheduleGuard};
pub use error::{Result, SchedulerError};
pub use schedule::next_fire_after;
pub use types::{ReminderSlot, ScheduleHandle, SlotState};

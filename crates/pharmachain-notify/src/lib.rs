//! `pharmachain-notify` — permission handling and reminder delivery.
//!
//! A [`Notifier`] owns the process-wide [`PermissionState`] and delivers one
//! reminder at a time. [`PlatformNotifier`] implements it on top of a
//! [`NotificationPlatform`]: the native notification when permission is
//! granted, the synchronous alert otherwise. The alert is never skipped.

pub mod console;
pub mod error;
pub mod notifier;
pub mod platform;
pub mod types;

pub use console::ConsolePlatform;
pub use error::NotifyError;
pub use notifier::{Notifier, PlatformNotifier};
pub use platform::NotificationPlatform;
pub use types::{DeliveryChannel, PermissionState};

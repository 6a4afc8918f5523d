use async_trait::async_trait;

use crate::{error::NotifyError, types::PermissionState};

/// The host's notification capability (desktop notifier, browser bridge,
/// terminal, …).
///
/// Implementations must be `Send + Sync` so a single platform can back the
/// process-wide notifier shared by every schedule.
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Stable lowercase identifier used in logs (e.g. `"console"`).
    fn name(&self) -> &str;

    /// Ask the user for permission to show native notifications.
    ///
    /// May return `Unknown` when the user dismissed the prompt without
    /// answering.
    async fn request_permission(&self) -> Result<PermissionState, NotifyError>;

    /// Show a native, non-blocking notification.
    async fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Synchronous alert that blocks until acknowledged or written.
    ///
    /// Infallible by contract: this is the path of last resort.
    fn alert(&self, text: &str);
}

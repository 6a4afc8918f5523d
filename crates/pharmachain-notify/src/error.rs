use thiserror::Error;

/// Errors raised by a notification platform.
///
/// None of these ever reach the scheduler: the notifier degrades to the
/// fallback alert instead.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The platform could not answer the permission request.
    #[error("Permission request failed: {0}")]
    PermissionRequest(String),

    /// The native notification could not be shown.
    #[error("Show failed: {0}")]
    ShowFailed(String),
}

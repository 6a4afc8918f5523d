use std::sync::RwLock;

use async_trait::async_trait;
use pharmachain_core::ReminderMessage;
use tracing::{debug, info, warn};

use crate::{
    platform::NotificationPlatform,
    types::{DeliveryChannel, PermissionState},
};

/// What the scheduler needs from the notification side.
///
/// One instance is shared (behind an `Arc`) by every schedule in the process,
/// which makes its permission state process-wide.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Current permission without prompting.
    fn permission(&self) -> PermissionState;

    /// Ask for permission; the only operation allowed to change the state.
    async fn request_permission(&self) -> PermissionState;

    /// Deliver one reminder, returning the channel that carried it.
    async fn deliver(&self, message: &ReminderMessage) -> DeliveryChannel;
}

/// [`Notifier`] over a concrete [`NotificationPlatform`].
pub struct PlatformNotifier<P> {
    platform: P,
    permission: RwLock<PermissionState>,
    /// Serialises prompts so concurrent schedules ask the user once.
    request_lock: tokio::sync::Mutex<()>,
}

impl<P: NotificationPlatform> PlatformNotifier<P> {
    /// Create a notifier whose permission starts as `Unknown`.
    pub fn new(platform: P) -> Self {
        Self::with_permission(platform, PermissionState::Unknown)
    }

    /// Create a notifier with a known initial permission (e.g. restored from
    /// the host platform at startup).
    pub fn with_permission(platform: P, initial: PermissionState) -> Self {
        Self {
            platform,
            permission: RwLock::new(initial),
            request_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn set_permission(&self, state: PermissionState) {
        *self.permission.write().expect("permission state poisoned") = state;
    }
}

#[async_trait]
impl<P: NotificationPlatform> Notifier for PlatformNotifier<P> {
    fn permission(&self) -> PermissionState {
        *self.permission.read().expect("permission state poisoned")
    }

    /// Prompt through the platform while the state is `Unknown`.
    ///
    /// Once the user has answered, the answer stands: later calls return it
    /// without prompting again. A platform error records `Denied`.
    async fn request_permission(&self) -> PermissionState {
        let _guard = self.request_lock.lock().await;

        let current = self.permission();
        if current != PermissionState::Unknown {
            debug!(permission = %current, "permission already resolved");
            return current;
        }

        let resolved = match self.platform.request_permission().await {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    platform = %self.platform.name(),
                    error = %e,
                    "permission request failed; reminders will use the fallback alert"
                );
                PermissionState::Denied
            }
        };
        self.set_permission(resolved);
        info!(platform = %self.platform.name(), permission = %resolved, "notification permission resolved");
        resolved
    }

    async fn deliver(&self, message: &ReminderMessage) -> DeliveryChannel {
        if self.permission().is_granted() {
            match self.platform.show(&message.title, &message.body).await {
                Ok(()) => {
                    debug!(platform = %self.platform.name(), "reminder shown natively");
                    return DeliveryChannel::Native;
                }
                Err(e) => {
                    warn!(platform = %self.platform.name(), error = %e, "native notification failed; falling back to alert");
                }
            }
        }

        self.platform.alert(&message.alert);
        debug!(platform = %self.platform.name(), "reminder delivered via fallback alert");
        DeliveryChannel::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use pharmachain_core::ReminderSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every call; answers permission requests with `answer`.
    struct FakePlatform {
        answer: Result<PermissionState, String>,
        show_fails: bool,
        prompts: AtomicUsize,
        shown: Mutex<Vec<String>>,
        alerts: Mutex<Vec<String>>,
    }

    impl FakePlatform {
        fn answering(answer: Result<PermissionState, String>) -> Self {
            Self {
                answer,
                show_fails: false,
                prompts: AtomicUsize::new(0),
                shown: Mutex::new(Vec::new()),
                alerts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NotificationPlatform for FakePlatform {
        fn name(&self) -> &str {
            "fake"
        }
        async fn request_permission(&self) -> Result<PermissionState, NotifyError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.answer
                .clone()
                .map_err(NotifyError::PermissionRequest)
        }
        async fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
            if self.show_fails {
                return Err(NotifyError::ShowFailed("no display".to_string()));
            }
            self.shown.lock().unwrap().push(format!("{title}|{body}"));
            Ok(())
        }
        fn alert(&self, text: &str) {
            self.alerts.lock().unwrap().push(text.to_string());
        }
    }

    fn message() -> ReminderMessage {
        ReminderSpec::parse("Ibuprofen", "200mg", "08:00").message()
    }

    #[tokio::test]
    async fn starts_unknown_and_alerts() {
        let notifier = PlatformNotifier::new(FakePlatform::answering(Ok(PermissionState::Granted)));
        assert_eq!(notifier.permission(), PermissionState::Unknown);

        let channel = notifier.deliver(&message()).await;
        assert_eq!(channel, DeliveryChannel::Fallback);
        assert_eq!(notifier.platform().alerts.lock().unwrap().len(), 1);
        assert!(notifier.platform().shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn granted_shows_native_notification() {
        let notifier = PlatformNotifier::new(FakePlatform::answering(Ok(PermissionState::Granted)));
        assert_eq!(notifier.request_permission().await, PermissionState::Granted);

        let channel = notifier.deliver(&message()).await;
        assert_eq!(channel, DeliveryChannel::Native);
        let shown = notifier.platform().shown.lock().unwrap().clone();
        assert_eq!(shown, vec!["💊 Medicine Reminder|Time to take Ibuprofen - 200mg".to_string()]);
        assert!(notifier.platform().alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn denied_still_delivers_through_alert() {
        let notifier = PlatformNotifier::new(FakePlatform::answering(Ok(PermissionState::Denied)));
        assert_eq!(notifier.request_permission().await, PermissionState::Denied);

        assert_eq!(notifier.deliver(&message()).await, DeliveryChannel::Fallback);
        let alerts = notifier.platform().alerts.lock().unwrap().clone();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("Ibuprofen - 200mg"));
    }

    #[tokio::test]
    async fn failed_show_falls_back_to_alert() {
        let mut platform = FakePlatform::answering(Ok(PermissionState::Granted));
        platform.show_fails = true;
        let notifier = PlatformNotifier::with_permission(platform, PermissionState::Granted);

        assert_eq!(notifier.deliver(&message()).await, DeliveryChannel::Fallback);
        assert_eq!(notifier.platform().alerts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn platform_error_records_denied() {
        let notifier = PlatformNotifier::new(FakePlatform::answering(Err("boom".to_string())));
        assert_eq!(notifier.request_permission().await, PermissionState::Denied);
        assert_eq!(notifier.permission(), PermissionState::Denied);
    }

    #[tokio::test]
    async fn answer_is_not_requested_twice() {
        let notifier = PlatformNotifier::new(FakePlatform::answering(Ok(PermissionState::Granted)));
        notifier.request_permission().await;
        notifier.request_permission().await;
        assert_eq!(notifier.platform().prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dismissed_prompt_stays_unknown_and_can_be_asked_again() {
        let notifier = PlatformNotifier::new(FakePlatform::answering(Ok(PermissionState::Unknown)));
        assert_eq!(notifier.request_permission().await, PermissionState::Unknown);
        assert_eq!(notifier.request_permission().await, PermissionState::Unknown);
        assert_eq!(notifier.platform().prompts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn initial_denied_is_never_upgraded_by_delivery() {
        let notifier = PlatformNotifier::with_permission(
            FakePlatform::answering(Ok(PermissionState::Granted)),
            PermissionState::Denied,
        );
        notifier.deliver(&message()).await;
        assert_eq!(notifier.permission(), PermissionState::Denied);
        assert_eq!(notifier.request_permission().await, PermissionState::Denied);
        assert_eq!(notifier.platform().prompts.load(Ordering::SeqCst), 0);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

use pharmachain_core::CanonicalId;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::store::ApiClient;
use crate::types::VerificationOutcome;

/// Checks a prescription's hash against the ledger via the backend.
///
/// Each call is one request: no caching, no retries.
#[derive(Debug)]
pub struct VerificationClient {
    api: ApiClient,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the check finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl VerificationClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a check is running; UIs disable the trigger meanwhile.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Verify `uid`. Every failure, including a concurrent call, reads as
    /// not verified; the cause only goes to the debug log.
    pub async fn verify(&self, uid: &CanonicalId) -> VerificationOutcome {
        match self.try_verify(uid).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(uid = %uid, code = e.code(), error = %e, "verification failed");
                VerificationOutcome::negative()
            }
        }
    }

    /// `GET /prescriptions/{uid}/verify` with the failure cause kept.
    pub async fn try_verify(&self, uid: &CanonicalId) -> Result<VerificationOutcome> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(ApiError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let outcome: VerificationOutcome = self
            .api
            .get_json(
                &["prescriptions", uid.as_str(), "verify"],
                "verification",
                uid,
            )
            .await?;
        debug!(uid = %uid, verified = outcome.verified, "verification finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_for, serve_gated, serve_once};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn verified_with_explorer_link() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"verified":true,"explorerUrl":"https://explorer.example/tx/abc"}"#,
        )
        .await;
        let client = VerificationClient::new(client_for(&base, None));

        let out = client.verify(&CanonicalId::from("rx-42")).await;
        assert!(out.verified);
        assert_eq!(
            out.explorer_url.as_deref(),
            Some("https://explorer.example/tx/abc")
        );
        assert!(request
            .await
            .unwrap()
            .starts_with("GET /api/prescriptions/rx-42/verify "));
        assert!(!client.is_in_flight());
    }

    #[tokio::test]
    async fn hash_mismatch_passes_through() {
        let (base, _) = serve_once("200 OK", r#"{"verified":false}"#).await;
        let client = VerificationClient::new(client_for(&base, None));
        assert_eq!(
            client.verify(&CanonicalId::from("rx-1")).await,
            VerificationOutcome::negative()
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_negative() {
        let client = VerificationClient::new(client_for("http://127.0.0.1:1/api", None));
        let uid = CanonicalId::from("rx-1");

        assert_eq!(client.verify(&uid).await, VerificationOutcome::negative());
        assert!(matches!(
            client.try_verify(&uid).await,
            Err(ApiError::Transport(_))
        ));
        assert!(!client.is_in_flight());
    }

    #[tokio::test]
    async fn error_status_and_bad_body_are_negative() {
        let (base, _) = serve_once("500 Internal Server Error", "oops").await;
        let client = VerificationClient::new(client_for(&base, None));
        assert!(!client.verify(&CanonicalId::from("rx-1")).await.verified);

        let (base, _) = serve_once("200 OK", "not json").await;
        let client = VerificationClient::new(client_for(&base, None));
        assert!(!client.verify(&CanonicalId::from("rx-1")).await.verified);
    }

    #[tokio::test]
    async fn second_call_while_in_flight_is_refused() {
        let (release, gate) = oneshot::channel();
        let (base, _) = serve_gated("200 OK", r#"{"verified":true}"#, Some(gate)).await;
        let client = Arc::new(VerificationClient::new(client_for(&base, None)));

        let first = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.verify(&CanonicalId::from("rx-1")).await }
        });
        while !client.is_in_flight() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            client.try_verify(&CanonicalId::from("rx-1")).await,
            Err(ApiError::InFlight)
        ));
        assert!(!client.verify(&CanonicalId::from("rx-1")).await.verified);

        release.send(()).unwrap();
        assert!(first.await.unwrap().verified);
        assert!(!client.is_in_flight());
    }
}

use pharmachain_core::config::ApiConfig;
use pharmachain_core::{CanonicalId, IdKind};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::types::{Patient, PatientEnvelope, Prescription, PrescriptionEnvelope};

const USER_AGENT: &str = concat!("pharmachain/", env!("CARGO_PKG_VERSION"));

/// Thin client for the prescription backend.
///
/// No client-side timeout is set; callers that need one wrap the future.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /prescriptions/{uid}`.
    pub async fn prescription(&self, uid: &CanonicalId) -> Result<Prescription> {
        let env: PrescriptionEnvelope = self
            .get_json(&["prescriptions", uid.as_str()], "prescription", uid)
            .await?;
        Ok(env.prescription)
    }

    /// `GET /auth/patient/{id}`.
    pub async fn patient(&self, id: &CanonicalId) -> Result<Patient> {
        let env: PatientEnvelope = self
            .get_json(&["auth", "patient", id.as_str()], "patient", id)
            .await?;
        Ok(env.patient)
    }

    /// Whether the record behind a scanned id can be fetched.
    ///
    /// Any failure reads as "not there"; the cause is logged at debug.
    pub async fn exists(&self, kind: IdKind, id: &CanonicalId) -> bool {
        let found = match kind {
            IdKind::Prescription => self.prescription(id).await.map(|_| ()),
            IdKind::Patient => self.patient(id).await.map(|_| ()),
        };
        match found {
            Ok(()) => true,
            Err(e) => {
                debug!(%kind, id = %id, code = e.code(), error = %e, "lookup failed");
                false
            }
        }
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        resource: &str,
        id: &CanonicalId,
    ) -> Result<T> {
        if id.is_empty() {
            return Err(ApiError::NotFound {
                resource: resource.to_string(),
            });
        }

        let url = self.url(segments)?;
        let mut req = self.http.get(url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                resource: format!("{resource} {id}"),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

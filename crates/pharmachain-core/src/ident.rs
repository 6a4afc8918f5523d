//! Identifier resolution for scanned QR payloads and pasted links.
//!
//! A QR code printed by the pharmacy encodes a full link such as
//! `https://app.example/prescription/AB12`, while a patient typing the code by
//! hand enters just `AB12`. Both must resolve to the same [`CanonicalId`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::CanonicalId;

/// The two entity kinds a scanned or typed identifier can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    #[default]
    Prescription,
    Patient,
}

impl IdKind {
    /// Path segment that precedes the bare id in a share link.
    pub fn marker(&self) -> &'static str {
        match self {
            IdKind::Prescription => "/prescription/",
            IdKind::Patient => "/patient/",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKind::Prescription => write!(f, "prescription"),
            IdKind::Patient => write!(f, "patient"),
        }
    }
}

impl std::str::FromStr for IdKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "prescription" => Ok(IdKind::Prescription),
            "patient" => Ok(IdKind::Patient),
            other => Err(format!("unknown id kind: {other}")),
        }
    }
}

/// Resolve raw scan/paste text to the canonical id for `kind`.
pub fn resolve(raw: &str, kind: IdKind) -> CanonicalId {
    resolve_with_marker(raw, kind.marker())
}

/// Trim `raw`; if it contains `marker`, keep everything after the first
/// occurrence, otherwise the trimmed text is already canonical.
///
/// Total: there is no failing input, a blank string yields an empty id.
pub fn resolve_with_marker(raw: &str, marker: &str) -> CanonicalId {
    let trimmed = raw.trim();
    if marker.is_empty() {
        return CanonicalId(trimmed.to_string());
    }
    match trimmed.split_once(marker) {
        Some((_, rest)) => CanonicalId(rest.to_string()),
        None => CanonicalId(trimmed.to_string()),
    }
}

/// Build the link encoded into QR codes, e.g. `{origin}/patient/42`.
pub fn share_url(origin: &str, kind: IdKind, id: &CanonicalId) -> String {
    format!("{}{}{}", origin.trim_end_matches('/'), kind.marker(), id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescription_url_yields_trailing_code() {
        let id = resolve("http://x/prescription/AB12", IdKind::Prescription);
        assert_eq!(id.as_str(), "AB12");
    }

    #[test]
    fn bare_code_is_trimmed() {
        assert_eq!(resolve(" AB12 ", IdKind::Prescription).as_str(), "AB12");
        assert_eq!(resolve("\tAB12\n", IdKind::Patient).as_str(), "AB12");
    }

    #[test]
    fn patient_url_with_patient_marker() {
        assert_eq!(resolve("http://x/patient/42", IdKind::Patient).as_str(), "42");
    }

    #[test]
    fn marker_of_other_kind_is_left_alone() {
        // A patient link scanned into the prescription box is not rewritten.
        let id = resolve("http://x/patient/42", IdKind::Prescription);
        assert_eq!(id.as_str(), "http://x/patient/42");
    }

    #[test]
    fn blank_input_resolves_to_empty_id() {
        let id = resolve("   ", IdKind::Prescription);
        assert!(id.is_empty());
    }

    #[test]
    fn url_ending_in_marker_resolves_to_empty_id() {
        let id = resolve("https://app.example/prescription/", IdKind::Prescription);
        assert!(id.is_empty());
    }

    #[test]
    fn custom_marker() {
        let id = resolve_with_marker("scan://rx/ABC", "/rx/");
        assert_eq!(id.as_str(), "ABC");
    }

    #[test]
    fn share_url_resolves_back() {
        let id = CanonicalId::from("42");
        let url = share_url("http://localhost:3000/", IdKind::Patient, &id);
        assert_eq!(url, "http://localhost:3000/patient/42");
        assert_eq!(resolve(&url, IdKind::Patient), id);
    }

    #[test]
    fn kind_parses_from_cli_text() {
        assert_eq!("patient".parse::<IdKind>().unwrap(), IdKind::Patient);
        assert!("doctor".parse::<IdKind>().is_err());
    }
}

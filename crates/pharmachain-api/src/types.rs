use pharmachain_core::reminder::preset_times;
use pharmachain_core::ReminderSpec;
use serde::{Deserialize, Deserializer, Serialize};

/// A prescription as served by `GET /prescriptions/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(default)]
    pub uid: String,
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    /// Doses per day.
    #[serde(default)]
    pub frequency: Option<u32>,
    /// Comma-separated `HH:MM` list, as entered by the pharmacist.
    #[serde(default)]
    pub times: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub patient_name: String,
    /// Hash anchored on the ledger; present once the record is on-chain.
    #[serde(default)]
    pub solana_data_hash: Option<String>,
    #[serde(default)]
    pub pharmacy: Option<Pharmacy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub name: String,
}

impl Prescription {
    /// Reminder spec for this prescription.
    ///
    /// A record with an empty `times` falls back to the preset list for its
    /// frequency, if there is one.
    pub fn reminder_spec(&self) -> ReminderSpec {
        let times = if self.times.trim().is_empty() {
            self.frequency.map(preset_times).unwrap_or_default()
        } else {
            self.times.as_str()
        };
        ReminderSpec::parse(self.medicine_name.clone(), self.dosage.clone(), times)
    }

    pub fn is_anchored(&self) -> bool {
        self.solana_data_hash
            .as_deref()
            .is_some_and(|h| !h.is_empty())
    }
}

/// A patient as served by `GET /auth/patient/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Numeric on some backends, string on others.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
}

/// Result of a ledger check. Serialized as `{verified, explorerUrl}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl VerificationOutcome {
    /// What every failed check reports.
    pub fn negative() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PrescriptionEnvelope {
    pub prescription: Prescription,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatientEnvelope {
    pub patient: Patient,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

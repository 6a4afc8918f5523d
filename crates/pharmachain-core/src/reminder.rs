//! Reminder data model shared between the scheduler engine, the notifier and
//! the remote store records.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::{CoreError, Result};

/// Notification title used for every medicine reminder.
pub const REMINDER_TITLE: &str = "💊 Medicine Reminder";

/// A wall-clock time of day, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time, rejecting hours above 23 and minutes above 59.
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::InvalidTime {
                entry: format!("{hour}:{minute}"),
                reason: "out of range".to_string(),
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// The time as `HH:MM:00.000`.
    pub fn to_naive_time(&self) -> NaiveTime {
        // Range was checked on construction, so this always succeeds.
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = CoreError;

    /// Accepts `H:MM`, `HH:MM` or `HH:M`; both fields must be 1-2 ASCII digits.
    fn from_str(s: &str) -> Result<Self> {
        let entry = s.trim();
        let invalid = |reason: &str| CoreError::InvalidTime {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let (h, m) = entry.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        let field = |part: &str| -> Option<u8> {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        };
        let hour = field(h).ok_or_else(|| invalid("hour is not a number"))?;
        let minute = field(m).ok_or_else(|| invalid("minute is not a number"))?;
        Self::new(hour, minute).map_err(|_| invalid("out of range"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Parse a comma-separated list such as `"08:00, 20:00"`.
///
/// Malformed entries are dropped (and logged) instead of failing the whole
/// list. Order and duplicates are preserved.
pub fn parse_times(list: &str) -> Vec<TimeOfDay> {
    list.split(',')
        .filter_map(|entry| match entry.parse::<TimeOfDay>() {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(entry = %entry.trim(), error = %e, "dropping malformed reminder time");
                None
            }
        })
        .collect()
}

/// Default daily times for a prescription taken `frequency` times per day.
///
/// Returns an empty list for frequencies without a preset.
pub fn preset_times(frequency: u32) -> &'static str {
    match frequency {
        1 => "08:00",
        2 => "08:00,20:00",
        3 => "08:00,14:00,20:00",
        4 => "08:00,12:00,16:00,20:00",
        _ => "",
    }
}

/// Immutable description of a daily dosing schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSpec {
    /// Shown in every reminder; scheduling is skipped while it is blank.
    pub medicine_name: String,
    /// Display string, never interpreted.
    pub dosage: String,
    /// One slot per entry, in the order given.
    pub times: Vec<TimeOfDay>,
}

impl ReminderSpec {
    pub fn new(
        medicine_name: impl Into<String>,
        dosage: impl Into<String>,
        times: Vec<TimeOfDay>,
    ) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            dosage: dosage.into(),
            times,
        }
    }

    /// Build a spec from the comma-separated `times` field of a prescription.
    pub fn parse(medicine_name: impl Into<String>, dosage: impl Into<String>, times: &str) -> Self {
        Self::new(medicine_name, dosage, parse_times(times))
    }

    /// False while inputs are still incomplete (blank name or no valid time).
    pub fn is_schedulable(&self) -> bool {
        !self.medicine_name.trim().is_empty() && !self.times.is_empty()
    }

    /// The text delivered when one of this spec's slots fires.
    pub fn message(&self) -> ReminderMessage {
        ReminderMessage {
            title: REMINDER_TITLE.to_string(),
            body: format!("Time to take {} - {}", self.medicine_name, self.dosage),
            alert: format!(
                "💊 Time to take your medicine!\n{} - {}",
                self.medicine_name, self.dosage
            ),
        }
    }
}

/// Ready-to-send reminder text for both delivery channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMessage {
    /// Title of the native notification.
    pub title: String,
    /// Body of the native notification.
    pub body: String,
    /// Full text of the synchronous fallback alert.
    pub alert: String,
}

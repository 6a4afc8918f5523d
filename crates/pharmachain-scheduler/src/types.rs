use chrono::{DateTime, Utc};
use pharmachain_core::{ScheduleId, TimeOfDay};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one reminder slot.
///
/// `Unarmed → Armed → (Fired → Armed)*`, ending in `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// Created, waiting for the permission request to resolve.
    Unarmed,
    /// A timer is pending for `next_fire_at`.
    Armed,
    /// The timer elapsed and the reminder is being delivered.
    Fired,
    /// Stopped; no timer will ever fire for this slot again.
    Cancelled,
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SlotState::Unarmed => "unarmed",
            SlotState::Armed => "armed",
            SlotState::Fired => "fired",
            SlotState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Scheduler-owned state of one daily time within a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSlot {
    /// Position of the time in the spec (duplicates get distinct indices).
    pub index: usize,
    pub time: TimeOfDay,
    pub state: SlotState,
    /// Set while armed; always in the future at the moment of arming.
    pub next_fire_at: Option<DateTime<Utc>>,
    /// Number of deliveries made by this slot.
    pub fire_count: u32,
}

impl ReminderSlot {
    pub fn new(index: usize, time: TimeOfDay) -> Self {
        Self {
            index,
            time,
            state: SlotState::Unarmed,
            next_fire_at: None,
            fire_count: 0,
        }
    }

    /// Transition to `Armed`. A cancelled slot stays cancelled.
    pub(crate) fn arm(&mut self, at: DateTime<Utc>) -> bool {
        if self.state == SlotState::Cancelled {
            return false;
        }
        self.state = SlotState::Armed;
        self.next_fire_at = Some(at);
        true
    }

    /// Transition `Armed → Fired`. Returns `false` (and changes nothing) for
    /// any other state, in particular a cancelled slot.
    pub(crate) fn fire(&mut self) -> bool {
        if self.state != SlotState::Armed {
            return false;
        }
        self.state = SlotState::Fired;
        self.fire_count += 1;
        true
    }

    pub(crate) fn cancel(&mut self) {
        self.state = SlotState::Cancelled;
        self.next_fire_at = None;
    }
}

/// Returned by `start`; pass it back to `stop`.
///
/// An inert handle (incomplete spec) owns nothing; stopping it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleHandle {
    id: Option<ScheduleId>,
}

impl ScheduleHandle {
    pub(crate) fn active(id: ScheduleId) -> Self {
        Self { id: Some(id) }
    }

    pub(crate) fn inert() -> Self {
        Self { id: None }
    }

    pub fn id(&self) -> Option<ScheduleId> {
        self.id
    }

    pub fn is_inert(&self) -> bool {
        self.id.is_none()
    }
}

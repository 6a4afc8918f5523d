use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pharmachain_core::{ReminderMessage, ReminderSpec, ScheduleId};
use pharmachain_notify::{Notifier, PermissionState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    clock::{Clock, SystemClock},
    error::{Result, SchedulerError},
    schedule::plan_next,
    types::{ReminderSlot, ScheduleHandle},
};

type SharedSlot = Arc<Mutex<ReminderSlot>>;

/// Everything the scheduler tracks for one started spec.
struct ScheduleEntry {
    medicine_name: String,
    /// Parent of every slot's token; cancelling it stops the whole schedule.
    token: CancellationToken,
    slots: Vec<SharedSlot>,
}

struct Shared<C> {
    clock: C,
    notifier: Arc<dyn Notifier>,
    schedules: DashMap<ScheduleId, ScheduleEntry>,
}

/// Arms, fires and re-arms daily medicine reminders.
///
/// Each slot is a chain of one-shot Tokio sleeps: after every fire the next
/// instant is recomputed from wall-clock time, so drift never accumulates
/// across days. Cheap to clone; clones share the same set of schedules.
///
/// `start` spawns onto the current Tokio runtime and must be called from
/// within one.
pub struct ReminderScheduler<C: Clock = SystemClock> {
    shared: Arc<Shared<C>>,
}

impl<C: Clock> Clone for ReminderScheduler<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl ReminderScheduler<SystemClock> {
    /// Scheduler on the host's local time zone.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(notifier, SystemClock)
    }
}

impl<C: Clock> ReminderScheduler<C> {
    pub fn with_clock(notifier: Arc<dyn Notifier>, clock: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                notifier,
                schedules: DashMap::new(),
            }),
        }
    }

    /// Start reminding for `spec`. Returns immediately.
    ///
    /// An incomplete spec (blank name, no valid time) is not an error: the
    /// returned handle is inert and nothing is armed. When permission is
    /// still unknown it is requested first and the slots are armed once it
    /// resolves, whatever the answer.
    pub fn start(&self, spec: ReminderSpec) -> ScheduleHandle {
        if !spec.is_schedulable() {
            debug!(
                medicine = %spec.medicine_name,
                times = spec.times.len(),
                "reminder spec incomplete; not scheduling"
            );
            return ScheduleHandle::inert();
        }

        let id = ScheduleId::new();
        let token = CancellationToken::new();
        let slots: Vec<SharedSlot> = spec
            .times
            .iter()
            .enumerate()
            .map(|(index, time)| Arc::new(Mutex::new(ReminderSlot::new(index, *time))))
            .collect();

        self.shared.schedules.insert(
            id,
            ScheduleEntry {
                medicine_name: spec.medicine_name.clone(),
                token: token.clone(),
                slots: slots.clone(),
            },
        );
        info!(
            schedule_id = %id,
            medicine = %spec.medicine_name,
            slots = slots.len(),
            "reminder schedule started"
        );

        tokio::spawn(run_schedule(
            Arc::clone(&self.shared),
            id,
            Arc::new(spec.message()),
            slots,
            token,
        ));
        ScheduleHandle::active(id)
    }

    /// Like [`start`](Self::start), but the schedule stops when the guard is
    /// dropped, including on early returns and unwinding.
    pub fn start_scoped(&self, spec: ReminderSpec) -> ScheduleGuard<C> {
        ScheduleGuard {
            handle: self.start(spec),
            scheduler: self.clone(),
        }
    }

    /// Cancel every timer of the schedule behind `handle`.
    ///
    /// Returns `false` when there was nothing to stop (inert handle, already
    /// stopped). Once this returns no slot of the schedule starts a new
    /// delivery, even for a timer that elapsed in the same tick; a delivery
    /// already committed before the stop may still be completing.
    pub fn stop(&self, handle: &ScheduleHandle) -> bool {
        let Some(id) = handle.id() else {
            return false;
        };
        let Some((_, entry)) = self.shared.schedules.remove(&id) else {
            debug!(schedule_id = %id, "stop on inactive schedule ignored");
            return false;
        };

        entry.token.cancel();
        for slot in &entry.slots {
            lock(slot).cancel();
        }
        info!(schedule_id = %id, medicine = %entry.medicine_name, "reminder schedule stopped");
        true
    }

    /// Stop every active schedule. Returns how many were stopped.
    pub fn stop_all(&self) -> usize {
        let ids: Vec<ScheduleId> = self.shared.schedules.iter().map(|e| *e.key()).collect();
        ids.into_iter()
            .filter(|id| self.stop(&ScheduleHandle::active(*id)))
            .count()
    }

    /// Number of schedules started and not yet stopped.
    pub fn active_count(&self) -> usize {
        self.shared.schedules.len()
    }

    /// Snapshot of the schedule's slots, in spec order.
    ///
    /// Empty for an inert handle; `ScheduleNotFound` once stopped.
    pub fn slots(&self, handle: &ScheduleHandle) -> Result<Vec<ReminderSlot>> {
        let Some(id) = handle.id() else {
            return Ok(Vec::new());
        };
        let entry = self
            .shared
            .schedules
            .get(&id)
            .ok_or_else(|| SchedulerError::ScheduleNotFound { id: id.to_string() })?;
        Ok(entry.slots.iter().map(|s| lock(s).clone()).collect())
    }
}

/// Owns a running schedule for the lifetime of a scope.
pub struct ScheduleGuard<C: Clock = SystemClock> {
    scheduler: ReminderScheduler<C>,
    handle: ScheduleHandle,
}

impl<C: Clock> ScheduleGuard<C> {
    pub fn handle(&self) -> ScheduleHandle {
        self.handle
    }
}

impl<C: Clock> Drop for ScheduleGuard<C> {
    fn drop(&mut self) {
        self.scheduler.stop(&self.handle);
    }
}

// --- private helpers ---------------------------------------------------

fn lock(slot: &SharedSlot) -> MutexGuard<'_, ReminderSlot> {
    slot.lock().expect("slot state poisoned")
}

/// Resolve permission if needed, then hand every slot its own timer task.
async fn run_schedule<C: Clock>(
    shared: Arc<Shared<C>>,
    id: ScheduleId,
    message: Arc<ReminderMessage>,
    slots: Vec<SharedSlot>,
    token: CancellationToken,
) {
    if shared.notifier.permission() == PermissionState::Unknown {
        debug!(schedule_id = %id, "requesting notification permission before arming");
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(schedule_id = %id, "stopped while permission was pending");
                return;
            }
            state = shared.notifier.request_permission() => {
                if !state.is_granted() {
                    info!(schedule_id = %id, permission = %state, "reminders will use the fallback alert");
                }
            }
        }
    }

    for slot in slots {
        tokio::spawn(run_slot(
            Arc::clone(&shared),
            id,
            slot,
            Arc::clone(&message),
            token.child_token(),
        ));
    }
}

/// Arm → sleep → fire → re-arm, until cancelled.
async fn run_slot<C: Clock>(
    shared: Arc<Shared<C>>,
    id: ScheduleId,
    slot: SharedSlot,
    message: Arc<ReminderMessage>,
    token: CancellationToken,
) {
    let (index, time) = {
        let s = lock(&slot);
        (s.index, s.time)
    };
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let Some((fire_at, delay)) = plan_next(&shared.clock, time, last_fired) else {
            let e = SchedulerError::Unschedulable {
                time: time.to_string(),
                reason: "no next occurrence in calendar range".to_string(),
            };
            error!(schedule_id = %id, slot = index, error = %e, "slot disarmed");
            lock(&slot).cancel();
            return;
        };
        let deadline = tokio::time::Instant::now() + delay;

        {
            // Checked under the slot lock: stop() cancels the token before
            // taking it, so a stopped slot is never re-armed.
            let mut s = lock(&slot);
            if token.is_cancelled() || !s.arm(fire_at) {
                return;
            }
        }
        debug!(schedule_id = %id, slot = index, %time, next_fire_at = %fire_at, "slot armed");

        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = tokio::time::sleep_until(deadline) => {}
        }
        {
            // A stop in the same tick as the timer wins. Checked under the
            // slot lock so stop() either sees this fire committed or the
            // slot never fires.
            let mut s = lock(&slot);
            if token.is_cancelled() || !s.fire() {
                return;
            }
        }
        let channel = shared.notifier.deliver(&message).await;
        info!(
            schedule_id = %id,
            slot = index,
            %time,
            fired_at = %fire_at,
            ?channel,
            "reminder delivered"
        );
        last_fired = Some(fire_at);
    }
}

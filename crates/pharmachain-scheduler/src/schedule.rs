use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use pharmachain_core::TimeOfDay;

use crate::clock::Clock;

/// Longest DST gap we step over when a local time does not exist.
const MAX_GAP_MINUTES: i64 = 3 * 60;

/// Next instant strictly after `now` at which `time` occurs in `now`'s zone.
///
/// Today's `HH:MM:00` if it is still ahead, otherwise the same wall time on
/// the next calendar date (23 or 25 hours away across a DST change, not a
/// fixed 24). Returns `None` only at the end of chrono's calendar range.
pub fn next_fire_after<Tz: TimeZone>(
    time: TimeOfDay,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    // Today, tomorrow; the third pass only matters for zones that skip a whole day.
    for _ in 0..3 {
        if let Some(candidate) = local_instant(&tz, date, time) {
            if candidate > *now {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

/// Map a local date + time to an instant.
///
/// Ambiguous local times (clocks rolled back) resolve to the earlier instant;
/// non-existent ones (clocks sprang forward) to the first valid minute after
/// the gap.
pub fn local_instant<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    time: TimeOfDay,
) -> Option<DateTime<Tz>> {
    let naive = date.and_time(time.to_naive_time());
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt);
    }
    (1..=MAX_GAP_MINUTES)
        .find_map(|m| tz.from_local_datetime(&(naive + Duration::minutes(m))).earliest())
}

/// Compute the next fire instant for a slot and the delay until it.
///
/// `not_before` is the occurrence that just fired: the search starts from
/// whichever is later, it or the clock's now, so a wall clock that lags the
/// timer can never yield the same occurrence twice.
pub fn plan_next<C: Clock + ?Sized>(
    clock: &C,
    time: TimeOfDay,
    not_before: Option<DateTime<Utc>>,
) -> Option<(DateTime<Utc>, std::time::Duration)> {
    let now = clock.now();
    let from = match not_before {
        Some(fired) if fired > now.with_timezone(&Utc) => fired.with_timezone(&now.timezone()),
        _ => now.clone(),
    };
    let next = next_fire_after(time, &from)?;
    let delay = next.clone().signed_duration_since(now).to_std().ok()?;
    Some((next.with_timezone(&Utc), delay))
}

use chrono::{DateTime, Local, TimeZone};

/// Source of wall-clock time for next-fire computation.
///
/// Timers themselves run on Tokio's clock; the wall clock only decides
/// *which* instant a slot should fire at next.
pub trait Clock: Send + Sync + 'static {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// The host's local time zone, so reminders follow DST transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Wall clock pinned to a Tokio instant: `now = origin + (tokio_now - anchor)`.
///
/// Under a paused Tokio runtime (`start_paused = true`) wall time advances
/// exactly as far as the runtime's timers do, which makes day-long schedules
/// testable in milliseconds.
#[derive(Debug, Clone)]
pub struct AnchoredClock<Tz: TimeZone> {
    origin: DateTime<Tz>,
    anchor: tokio::time::Instant,
}

impl<Tz: TimeZone> AnchoredClock<Tz> {
    /// Pin `origin` to the current Tokio instant.
    pub fn starting_at(origin: DateTime<Tz>) -> Self {
        Self {
            origin,
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl<Tz> Clock for AnchoredClock<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        let elapsed = chrono::Duration::from_std(self.anchor.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin
            .clone()
            .checked_add_signed(elapsed)
            .unwrap_or_else(|| self.origin.clone())
    }
}

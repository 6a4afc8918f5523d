use thiserror::Error;

/// Errors that can occur within the reminder scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No next occurrence could be computed (calendar range exhausted).
    #[error("Cannot schedule {time}: {reason}")]
    Unschedulable { time: String, reason: String },

    /// No active schedule with the given ID exists (never started or stopped).
    #[error("Schedule not found: {id}")]
    ScheduleNotFound { id: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

use super::config::InvalidConfig;
use super::signals::SignalError;

/// Terminal failures of a rating calculation. Per-user data gaps never surface
/// here; they resolve to zero contributions inside the calculators.
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("final rating config not found: {0}")]
    ConfigNotFound(String),
    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfig),
    #[error("signal fetch failed: {0}")]
    Signal(#[from] SignalError),
    #[error("calculation cancelled after {completed} of {total} users")]
    Cancelled { completed: usize, total: usize },
}

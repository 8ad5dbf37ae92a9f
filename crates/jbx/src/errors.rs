//! 💀 Errors — the short, curated list of ways a job can die.
//!
//! Malformed records are NOT on this list. They get logged, nulled, and waved
//! through, because one bad line should never sink a ten-million-line batch.
//! Everything here is structural: a bad destination, a failed preparation, a
//! writer that said no. Those fail fast and fail loud. 🦆

use thiserror::Error;

/// 🏷️ Every fatal outcome of preparing a job or emitting into it.
///
/// Plays nicely with `anyhow` via `?`, and stays downcastable on the other side
/// for the callers who want to know exactly which flavor of doom they got.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// 🧭 The location string wasn't `es://<index>/<objectType>`.
    #[error(
        "💀 Invalid destination '{location}': {reason}. Please specify a valid elasticsearch index, eg. es://myindex/myobj"
    )]
    InvalidDestination { location: String, reason: String },

    /// 📦 Config write or artifact distribution blew up. The job never starts.
    #[error("💀 Job preparation failed: {reason}")]
    PreparationFailure { reason: String },

    /// ⏳ Someone tried to emit before the job was prepared. Undefined behavior, now defined as "no".
    #[error("💀 Job has not been prepared yet; artifacts must be distributed before any record is emitted")]
    NotPrepared,

    /// 📡 The downstream writer refused a record. Fatal to the task.
    #[error("💀 Downstream writer rejected a record: {reason}")]
    EmissionFailure { reason: String },
}

impl JobError {
    pub(crate) fn invalid_destination(location: &str, reason: impl Into<String>) -> Self {
        JobError::InvalidDestination {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    /// 🧅 Peel the whole anyhow onion into one line so the reason survives a clone.
    pub(crate) fn preparation_failure(err: &anyhow::Error) -> Self {
        JobError::PreparationFailure {
            reason: format!("{err:#}"),
        }
    }

    pub(crate) fn emission_failure(err: &anyhow::Error) -> Self {
        JobError::EmissionFailure {
            reason: format!("{err:#}"),
        }
    }
}

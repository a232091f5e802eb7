use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Storage unavailable: {0:#}")]
    StorageUnavailable(#[source] anyhow::Error),

    #[error("Invalid goals: {0}")]
    InvalidGoals(String),

    #[error("Inference unavailable: {0:#}")]
    InferenceUnavailable(#[source] anyhow::Error),

    #[error("Inference timed out after {}ms", .0.as_millis())]
    InferenceTimeout(Duration),

    #[error("Malformed meal entry: {0}")]
    MalformedMealEntry(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoachError {
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Self::StorageUnavailable(err)
    }

    /// True for failures that leave the caller's data untouched and can be
    /// shown as a soft warning.
    #[must_use]
    pub fn is_inference(&self) -> bool {
        matches!(self, Self::InferenceUnavailable(_) | Self::InferenceTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;

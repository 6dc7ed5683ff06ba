//! Shared error types for the services crate.

use thiserror::Error;

use survey_core::model::{IdentityError, RatingError};
use storage::repository::StorageError;

use crate::survey::SurveyPhase;

/// Errors emitted by the survey services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurveyError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error("cannot {action} while the survey is in the {phase} phase")]
    WrongPhase {
        action: &'static str,
        phase: SurveyPhase,
    },
    #[error("the client store has not finished loading")]
    ClientStoreNotReady,
    #[error("the write pipeline has shut down")]
    PipelineClosed,
    #[error("stored respondent record is not valid: {0}")]
    Record(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error("invalid survey settings: {0}")]
    Settings(String),
}

use std::{error::Error as StdError, fmt};

use thiserror::Error;

use super::control::JobType;

/// Marker bounds for sub-task failure causes.
///
/// Causes cross observer callbacks and are rendered into the control plane's error
/// message store, so the usual `Send + Sync + 'static` bounds apply.
pub trait RunError: StdError + fmt::Debug + Send + Sync + 'static {}

impl<T: StdError + fmt::Debug + Send + Sync + 'static> RunError for T {}

/// Failures reported by [`JobControlClient`](super::control::JobControlClient)
/// implementations.
///
/// The runner treats every one of these as best-effort: logged, never allowed to block
/// local state updates or task shutdown.
#[derive(Debug, Error)]
pub enum ControlError {
	#[error("job control endpoint unavailable: {0}")]
	Unavailable(String),

	#[error(transparent)]
	Other(#[from] Box<dyn StdError + Send + Sync>),
}

/// A job id that does not follow the `'j'` + 2-digit type code format.
#[derive(Debug, Error)]
pub enum JobIdError {
	#[error("job id too short: '{0}'")]
	TooShort(String),

	#[error("job id missing 'j' marker: '{0}'")]
	MissingMarker(String),

	#[error("unknown job type code '{0}'")]
	UnknownTypeCode(String),
}

/// Errors surfaced while constructing a runner.
#[derive(Debug, Error)]
pub enum RunnerError {
	#[error(transparent)]
	JobId(#[from] JobIdError),

	#[error("no job control client registered for job type <{0}>")]
	ClientNotRegistered(JobType),
}

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{
	context::{JobItemContext, JobItemStatus},
	error::{ControlError, JobIdError, RunnerError},
};

/// Marker prefix of every pipeline job id.
const JOB_ID_MARKER: char = 'j';

/// Job category encoded in the second and third characters of a job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
	Migration,
	ConsistencyCheck,
}

impl JobType {
	/// Two-digit code carried in ids of jobs of this type.
	#[must_use]
	pub const fn code(self) -> &'static str {
		match self {
			Self::Migration => "01",
			Self::ConsistencyCheck => "02",
		}
	}
}

/// Extract the job type from a job id.
///
/// Ids are formatted as `'j'` + 2-digit type code + scenario-specific suffix.
pub fn parse_job_type(job_id: &str) -> Result<JobType, JobIdError> {
	if !job_id.starts_with(JOB_ID_MARKER) {
		return Err(JobIdError::MissingMarker(job_id.to_owned()));
	}

	match job_id
		.get(1..3)
		.ok_or_else(|| JobIdError::TooShort(job_id.to_owned()))?
	{
		"01" => Ok(JobType::Migration),
		"02" => Ok(JobType::ConsistencyCheck),
		code => Err(JobIdError::UnknownTypeCode(code.to_owned())),
	}
}

/// RPC surface of the external job-control plane.
///
/// Every call is best-effort from the runner's point of view: a failed write is logged
/// and never blocks local state updates or task shutdown.
#[async_trait]
pub trait JobControlClient: Send + Sync + 'static {
	/// Durably record the current progress snapshot of a job item. May be called
	/// repeatedly; last write wins.
	async fn persist_job_item_progress(
		&self,
		context: &JobItemContext,
	) -> Result<(), ControlError>;

	/// Publish a status transition for one job item.
	async fn update_job_item_status(
		&self,
		job_id: &str,
		sharding_item: u16,
		status: JobItemStatus,
	) -> Result<(), ControlError>;

	/// Record a human-readable failure cause for one job item.
	async fn persist_job_item_error_message(
		&self,
		job_id: &str,
		sharding_item: u16,
		message: &str,
	) -> Result<(), ControlError>;

	/// Request a cluster-wide halt of the whole job, all shards included.
	/// Fire-and-forget; callers do not wait for the halt to take effect.
	async fn stop(&self, job_id: &str) -> Result<(), ControlError>;
}

/// Job-control clients keyed by job type, one implementation per type.
///
/// A runner resolves its client here exactly once at construction and keeps the
/// returned `Arc` for its whole lifetime.
#[derive(Default, Clone)]
pub struct JobControlRegistry {
	clients: HashMap<JobType, Arc<dyn JobControlClient>>,
}

impl JobControlRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, job_type: JobType, client: Arc<dyn JobControlClient>) {
		self.clients.insert(job_type, client);
	}

	/// Resolve the client for the type encoded in `job_id`.
	pub fn client_for(&self, job_id: &str) -> Result<Arc<dyn JobControlClient>, RunnerError> {
		let job_type = parse_job_type(job_id)?;

		self.clients
			.get(&job_type)
			.cloned()
			.ok_or(RunnerError::ClientNotRegistered(job_type))
	}
}

impl fmt::Debug for JobControlRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("JobControlRegistry")
			.field("job_types", &self.clients.keys().collect::<Vec<_>>())
			.finish()
	}
}

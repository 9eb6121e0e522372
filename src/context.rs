use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

/// Externally visible execution status of one job item.
///
/// Transitions recorded by the runner are monotonic within a run: once
/// `ExecuteIncrementalTask` is reached the inventory statuses are never re-entered, and
/// a failure status is terminal for the item until externally reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, FromRepr)]
#[repr(u8)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobItemStatus {
	Preparing,
	PreparingFailure,
	ExecuteInventoryTask,
	ExecuteInventoryTaskFailure,
	ExecuteIncrementalTask,
	ExecuteIncrementalTaskFailure,
	Finished,
}

impl JobItemStatus {
	#[must_use]
	pub const fn is_failure(self) -> bool {
		matches!(
			self,
			Self::PreparingFailure
				| Self::ExecuteInventoryTaskFailure
				| Self::ExecuteIncrementalTaskFailure
		)
	}

	#[must_use]
	pub const fn is_running(self) -> bool {
		matches!(self, Self::ExecuteInventoryTask | Self::ExecuteIncrementalTask)
	}
}

/// Shared state of one shard of a job.
///
/// Constructed by the external scheduler and handed to exactly one runner. Only the
/// runner mutates `status` during a run; `stopping` may be flipped from a control
/// thread at any time. Both fields live behind atomics so every reader observes
/// transitions across threads.
#[derive(Debug)]
pub struct JobItemContext {
	job_id: String,
	sharding_item: u16,
	status: AtomicU8,
	stopping: AtomicBool,
}

impl JobItemContext {
	#[must_use]
	pub fn new(job_id: impl Into<String>, sharding_item: u16) -> Self {
		Self::with_status(job_id, sharding_item, JobItemStatus::Preparing)
	}

	/// Construct a context resuming from a previously persisted status.
	#[must_use]
	pub fn with_status(
		job_id: impl Into<String>,
		sharding_item: u16,
		status: JobItemStatus,
	) -> Self {
		Self {
			job_id: job_id.into(),
			sharding_item,
			status: AtomicU8::new(status as u8),
			stopping: AtomicBool::new(false),
		}
	}

	#[must_use]
	pub fn job_id(&self) -> &str {
		&self.job_id
	}

	#[must_use]
	pub const fn sharding_item(&self) -> u16 {
		self.sharding_item
	}

	#[must_use]
	pub fn status(&self) -> JobItemStatus {
		// The cell only ever holds discriminants written by `set_status`.
		JobItemStatus::from_repr(self.status.load(Ordering::Acquire))
			.unwrap_or(JobItemStatus::Preparing)
	}

	pub fn set_status(&self, status: JobItemStatus) {
		self.status.store(status as u8, Ordering::Release);
	}

	#[must_use]
	pub fn is_stopping(&self) -> bool {
		self.stopping.load(Ordering::Acquire)
	}

	pub fn set_stopping(&self, stopping: bool) {
		self.stopping.store(stopping, Ordering::Release);
	}
}

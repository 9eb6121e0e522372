use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc, Mutex,
};

use async_trait::async_trait;
use data_pipeline_core::{ControlError, JobControlClient, JobItemContext, JobItemStatus};

/// Control client recording every call for assertions.
#[derive(Debug, Default)]
pub struct RecordingControlClient {
	progress_persists: AtomicUsize,
	status_updates: Mutex<Vec<JobItemStatus>>,
	error_messages: Mutex<Vec<String>>,
	stop_requests: AtomicUsize,
}

impl RecordingControlClient {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn progress_persists(&self) -> usize {
		self.progress_persists.load(Ordering::Acquire)
	}

	pub fn status_updates(&self) -> Vec<JobItemStatus> {
		self.status_updates.lock().unwrap().clone()
	}

	pub fn error_messages(&self) -> Vec<String> {
		self.error_messages.lock().unwrap().clone()
	}

	pub fn stop_requests(&self) -> usize {
		self.stop_requests.load(Ordering::Acquire)
	}
}

#[async_trait]
impl JobControlClient for RecordingControlClient {
	async fn persist_job_item_progress(
		&self,
		_context: &JobItemContext,
	) -> Result<(), ControlError> {
		self.progress_persists.fetch_add(1, Ordering::AcqRel);
		Ok(())
	}

	async fn update_job_item_status(
		&self,
		_job_id: &str,
		_sharding_item: u16,
		status: JobItemStatus,
	) -> Result<(), ControlError> {
		self.status_updates.lock().unwrap().push(status);
		Ok(())
	}

	async fn persist_job_item_error_message(
		&self,
		_job_id: &str,
		_sharding_item: u16,
		message: &str,
	) -> Result<(), ControlError> {
		self.error_messages.lock().unwrap().push(message.to_owned());
		Ok(())
	}

	async fn stop(&self, _job_id: &str) -> Result<(), ControlError> {
		self.stop_requests.fetch_add(1, Ordering::AcqRel);
		Ok(())
	}
}

/// Control client failing every call, for the best-effort paths.
#[derive(Debug, Default)]
pub struct FailingControlClient;

#[async_trait]
impl JobControlClient for FailingControlClient {
	async fn persist_job_item_progress(
		&self,
		_context: &JobItemContext,
	) -> Result<(), ControlError> {
		Err(ControlError::Unavailable("control plane offline".to_owned()))
	}

	async fn update_job_item_status(
		&self,
		_job_id: &str,
		_sharding_item: u16,
		_status: JobItemStatus,
	) -> Result<(), ControlError> {
		Err(ControlError::Unavailable("control plane offline".to_owned()))
	}

	async fn persist_job_item_error_message(
		&self,
		_job_id: &str,
		_sharding_item: u16,
		_message: &str,
	) -> Result<(), ControlError> {
		Err(ControlError::Unavailable("control plane offline".to_owned()))
	}

	async fn stop(&self, _job_id: &str) -> Result<(), ControlError> {
		Err(ControlError::Unavailable("control plane offline".to_owned()))
	}
}

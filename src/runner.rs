use std::sync::{
	atomic::{AtomicBool, AtomicUsize, Ordering},
	Arc,
};

use async_trait::async_trait;
use tokio::{spawn, sync::Mutex};
use tracing::{debug, error, info, instrument, warn, Instrument};

use super::{
	context::{JobItemContext, JobItemStatus},
	control::{JobControlClient, JobControlRegistry},
	error::{RunError, RunnerError},
	progress,
	task::{CompletionHandle, CompletionStatus, PipelineTask},
};

/// The contract every per-item runner satisfies, whatever its phase structure.
///
/// Both operations may be invoked concurrently with each other and with the completion
/// observers spawned by a previous phase.
#[async_trait]
pub trait PipelineTasksRunner: Send + Sync {
	/// Context of the job item this runner drives.
	fn job_item_context(&self) -> Arc<JobItemContext>;

	/// Drive the job item forward from its current progress.
	async fn start(&self);

	/// Cooperatively halt and release every task of the job item.
	async fn stop(&self);
}

/// Drives one job item through its bulk inventory phase and then its incremental
/// change-capture phase.
///
/// The runner never blocks waiting for task completion: each completion handle gets an
/// observer spawned onto the runtime, and whichever handle resolves last decides from
/// its own completion context whether the phase advances. Failure of any handle marks
/// the job item failed and requests a job-wide stop.
pub struct InventoryIncrementalTasksRunner<E: RunError> {
	state: Arc<RunnerState<E>>,
}

struct RunnerState<E: RunError> {
	context: Arc<JobItemContext>,
	inventory_tasks: Vec<Arc<dyn PipelineTask<E>>>,
	incremental_tasks: Vec<Arc<dyn PipelineTask<E>>>,
	client: Arc<dyn JobControlClient>,
	// Serializes guard-check, status transition and task launch of a phase, so a
	// racing `start` and completion observer cannot interleave inside them. Held only
	// for launch-and-register, never for the lifetime of a phase.
	phase_gate: Mutex<()>,
	// Latch making the inventory launch single-flight per runner. Cleared again only
	// when the phase ends without the detector reporting all tasks finished, leaving
	// the phase retriggerable by a later `start`.
	inventory_launched: AtomicBool,
}

impl<E: RunError> InventoryIncrementalTasksRunner<E> {
	/// Resolves the job-control client for the job type encoded in the context's
	/// job id.
	pub fn new(
		context: Arc<JobItemContext>,
		inventory_tasks: Vec<Arc<dyn PipelineTask<E>>>,
		incremental_tasks: Vec<Arc<dyn PipelineTask<E>>>,
		registry: &JobControlRegistry,
	) -> Result<Self, RunnerError> {
		let client = registry.client_for(context.job_id())?;

		Ok(Self {
			state: Arc::new(RunnerState {
				context,
				inventory_tasks,
				incremental_tasks,
				client,
				phase_gate: Mutex::new(()),
				inventory_launched: AtomicBool::new(false),
			}),
		})
	}

	#[must_use]
	pub fn context(&self) -> &Arc<JobItemContext> {
		&self.state.context
	}

	/// See [`PipelineTasksRunner::start`].
	pub async fn start(&self) {
		self.state.start().await;
	}

	/// See [`PipelineTasksRunner::stop`].
	pub async fn stop(&self) {
		self.state.stop().await;
	}
}

#[async_trait]
impl<E: RunError> PipelineTasksRunner for InventoryIncrementalTasksRunner<E> {
	fn job_item_context(&self) -> Arc<JobItemContext> {
		Arc::clone(&self.state.context)
	}

	async fn start(&self) {
		self.state.start().await;
	}

	async fn stop(&self) {
		self.state.stop().await;
	}
}

impl<E: RunError> RunnerState<E> {
	#[instrument(
		skip(self),
		fields(job_id = %self.context.job_id(), sharding_item = self.context.sharding_item())
	)]
	async fn start(self: &Arc<Self>) {
		if self.context.is_stopping() {
			debug!("Stop requested before start, nothing to do;");
			return;
		}

		// Re-announces progress on resume even when no phase transition follows.
		if let Err(e) = self.client.persist_job_item_progress(&self.context).await {
			warn!(?e, "Failed to persist job item progress;");
		}

		if progress::all_inventory_tasks_finished(&self.inventory_tasks) {
			info!("All inventory tasks finished;");
			self.execute_incremental_tasks().await;
		} else {
			self.execute_inventory_tasks().await;
		}
	}

	async fn execute_inventory_tasks(self: &Arc<Self>) {
		let _phase = self.phase_gate.lock().await;

		if self.context.status().is_failure() {
			debug!("Job item already failed, ignoring inventory launch;");
			return;
		}

		if self.inventory_launched.swap(true, Ordering::AcqRel) {
			debug!("Inventory phase already in flight, ignoring;");
			return;
		}

		self.update_local_and_remote_status(JobItemStatus::ExecuteInventoryTask)
			.await;

		let handles = launch_unfinished(&self.inventory_tasks);
		if handles.is_empty() {
			// Tasks remain unfinished but produced no handles, so no observer will
			// ever fire; leave the phase retriggerable instead of stalling forever.
			warn!("Inventory tasks returned no completion handles, phase left unfinished;");
			self.inventory_launched.store(false, Ordering::Release);
			return;
		}

		let total = handles.len();
		let completed_count = Arc::new(AtomicUsize::new(0));

		for handle in handles {
			spawn({
				let this = Arc::clone(self);
				let completed_count = Arc::clone(&completed_count);

				async move {
					let status = handle.await;
					let completed = completed_count.fetch_add(1, Ordering::AcqRel) + 1;

					match status {
						CompletionStatus::Done if completed == total => {
							if progress::all_inventory_tasks_finished(&this.inventory_tasks) {
								info!("All inventory tasks finished;");
								this.execute_incremental_tasks().await;
							} else {
								info!(
									"Inventory handles completed, but some tasks \
									are not finished yet;"
								);
								this.inventory_launched.store(false, Ordering::Release);
							}
						}

						CompletionStatus::Done => {}

						CompletionStatus::Failed(cause) => {
							error!(?cause, "Inventory task execution failed;");
							this.fail_job_item(
								JobItemStatus::ExecuteInventoryTaskFailure,
								&cause.to_string(),
							)
							.await;
						}

						CompletionStatus::Dropped => {
							error!("Inventory completion handle dropped without resolving;");
							this.fail_job_item(
								JobItemStatus::ExecuteInventoryTaskFailure,
								"completion handle dropped without resolving",
							)
							.await;
						}
					}
				}
				.in_current_span()
			});
		}
	}

	async fn execute_incremental_tasks(self: &Arc<Self>) {
		let _phase = self.phase_gate.lock().await;

		if self.incremental_tasks.is_empty() {
			info!("No incremental tasks, ignoring;");
			return;
		}

		if self.context.status().is_failure() {
			debug!("Job item already failed, ignoring incremental launch;");
			return;
		}

		if self.context.status() == JobItemStatus::ExecuteIncrementalTask {
			info!("Job item already executing incremental tasks, ignoring;");
			return;
		}

		self.update_local_and_remote_status(JobItemStatus::ExecuteIncrementalTask)
			.await;

		let handles = launch_unfinished(&self.incremental_tasks);

		let total = handles.len();
		let completed_count = Arc::new(AtomicUsize::new(0));

		for handle in handles {
			spawn({
				let this = Arc::clone(self);
				let completed_count = Arc::clone(&completed_count);

				async move {
					let status = handle.await;
					let completed = completed_count.fetch_add(1, Ordering::AcqRel) + 1;

					match status {
						CompletionStatus::Done if completed == total => {
							info!("All incremental task handles completed;");
						}

						CompletionStatus::Done => {}

						CompletionStatus::Failed(cause) => {
							error!(?cause, "Incremental task execution failed;");
							this.fail_job_item(
								JobItemStatus::ExecuteIncrementalTaskFailure,
								&cause.to_string(),
							)
							.await;
						}

						CompletionStatus::Dropped => {
							error!("Incremental completion handle dropped without resolving;");
							this.fail_job_item(
								JobItemStatus::ExecuteIncrementalTaskFailure,
								"completion handle dropped without resolving",
							)
							.await;
						}
					}
				}
				.in_current_span()
			});
		}
	}

	/// Mark the job item failed, record the cause and request a job-wide stop.
	///
	/// Every failing handle goes through here independently; deduplication of the stop
	/// request belongs to the control plane.
	async fn fail_job_item(&self, status: JobItemStatus, message: &str) {
		self.update_local_and_remote_status(status).await;

		let job_id = self.context.job_id();

		if let Err(e) = self
			.client
			.persist_job_item_error_message(job_id, self.context.sharding_item(), message)
			.await
		{
			warn!(?e, "Failed to persist job item error message;");
		}

		if let Err(e) = self.client.stop(job_id).await {
			warn!(?e, "Failed to request job-wide stop;");
		}
	}

	/// Local field write and control-plane publish travel together; the local write
	/// always lands, even when the publish fails.
	async fn update_local_and_remote_status(&self, status: JobItemStatus) {
		self.context.set_status(status);

		if let Err(e) = self
			.client
			.update_job_item_status(self.context.job_id(), self.context.sharding_item(), status)
			.await
		{
			warn!(?e, %status, "Failed to publish job item status;");
		}
	}

	#[instrument(
		skip(self),
		fields(job_id = %self.context.job_id(), sharding_item = self.context.sharding_item())
	)]
	async fn stop(&self) {
		// Flipped first so any in-flight or future `start` bails out at its first
		// check.
		self.context.set_stopping(true);

		for task in self.inventory_tasks.iter().chain(&self.incremental_tasks) {
			if let Err(e) = task.stop().await {
				warn!(task_id = %task.id(), ?e, "Failed to stop task, releasing it anyway;");
			}
			task.close();
		}
	}
}

fn launch_unfinished<E: RunError>(tasks: &[Arc<dyn PipelineTask<E>>]) -> Vec<CompletionHandle<E>> {
	tasks
		.iter()
		.filter(|task| !task.position().is_finished())
		.flat_map(|task| task.start())
		.collect()
}

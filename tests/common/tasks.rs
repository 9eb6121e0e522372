use std::sync::{
	atomic::{AtomicBool, AtomicUsize, Ordering},
	Arc, Mutex,
};

use async_trait::async_trait;
use data_pipeline_core::{CompletionHandle, CompletionSignal, PipelineTask, Position, TaskId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
	#[error("sample task failed")]
	SampleError,
}

/// Task whose completion handles the test resolves by hand.
///
/// Every `start` hands out a single completion handle and parks its signal on the
/// controller, so tests decide when and how each unit of work resolves.
pub struct ManualTask {
	id: TaskId,
	state: Arc<ManualTaskState>,
}

#[derive(Default)]
struct ManualTaskState {
	finished: AtomicBool,
	fail_stop: AtomicBool,
	start_count: AtomicUsize,
	stop_count: AtomicUsize,
	close_count: AtomicUsize,
	signals: Mutex<Vec<CompletionSignal<SampleError>>>,
}

pub struct ManualTaskController {
	state: Arc<ManualTaskState>,
}

impl ManualTask {
	pub fn new() -> (Arc<Self>, ManualTaskController) {
		let state = Arc::new(ManualTaskState::default());

		(
			Arc::new(Self {
				id: TaskId::new_v4(),
				state: Arc::clone(&state),
			}),
			ManualTaskController { state },
		)
	}

	/// Variant whose `stop` always errors, for the best-effort release path.
	pub fn with_failing_stop() -> (Arc<Self>, ManualTaskController) {
		let (task, controller) = Self::new();
		controller.state.fail_stop.store(true, Ordering::Release);

		(task, controller)
	}
}

#[async_trait]
impl PipelineTask<SampleError> for ManualTask {
	fn id(&self) -> TaskId {
		self.id
	}

	fn position(&self) -> Position {
		if self.state.finished.load(Ordering::Acquire) {
			Position::Finished
		} else {
			Position::Beginning
		}
	}

	fn start(&self) -> Vec<CompletionHandle<SampleError>> {
		self.state.start_count.fetch_add(1, Ordering::AcqRel);

		let (signal, handle) = CompletionHandle::channel(self.id);
		self.state.signals.lock().unwrap().push(signal);

		vec![handle]
	}

	async fn stop(&self) -> Result<(), SampleError> {
		self.state.stop_count.fetch_add(1, Ordering::AcqRel);

		if self.state.fail_stop.load(Ordering::Acquire) {
			Err(SampleError::SampleError)
		} else {
			Ok(())
		}
	}

	fn close(&self) {
		self.state.close_count.fetch_add(1, Ordering::AcqRel);
	}
}

impl ManualTaskController {
	pub fn start_count(&self) -> usize {
		self.state.start_count.load(Ordering::Acquire)
	}

	pub fn stop_count(&self) -> usize {
		self.state.stop_count.load(Ordering::Acquire)
	}

	pub fn close_count(&self) -> usize {
		self.state.close_count.load(Ordering::Acquire)
	}

	/// Make the task report [`Position::Finished`] from now on.
	pub fn mark_finished(&self) {
		self.state.finished.store(true, Ordering::Release);
	}

	pub fn succeed_next(&self) {
		self.take_next_signal().succeed();
	}

	pub fn fail_next(&self) {
		self.take_next_signal().fail(SampleError::SampleError);
	}

	fn take_next_signal(&self) -> CompletionSignal<SampleError> {
		let mut signals = self.state.signals.lock().unwrap();
		assert!(!signals.is_empty(), "no pending completion signal to resolve");

		signals.remove(0)
	}
}

/// Task pinned at [`Position::Finished`] whose `start` fails the test if ever invoked.
pub struct FinishedGuardTask {
	id: TaskId,
}

impl FinishedGuardTask {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			id: TaskId::new_v4(),
		})
	}
}

#[async_trait]
impl PipelineTask<SampleError> for FinishedGuardTask {
	fn id(&self) -> TaskId {
		self.id
	}

	fn position(&self) -> Position {
		Position::Finished
	}

	fn start(&self) -> Vec<CompletionHandle<SampleError>> {
		panic!("task at finished position was started again")
	}

	async fn stop(&self) -> Result<(), SampleError> {
		Ok(())
	}

	fn close(&self) {}
}

use std::{
	fmt,
	future::Future,
	pin::Pin,
	task::{Context, Poll},
};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{trace, warn};
use uuid::Uuid;

use super::{error::RunError, position::Position};

/// A unique identifier for a sub-task using the [`uuid`](https://docs.rs/uuid) crate.
pub type TaskId = Uuid;

/// One sub-task of a job item, either a bounded snapshot copy ("inventory") or a
/// long-running change-capture unit ("incremental").
///
/// `start` fans the task's remaining work out into any number of completion handles;
/// the runner aggregates those instead of polling the task. A task whose position is
/// [`Position::Finished`] must never be started again.
///
/// All tasks driven by one runner report failures through the same error type `E`, so
/// the runner can record a unified failure cause against the job item.
#[async_trait]
pub trait PipelineTask<E: RunError>: Send + Sync + 'static {
	/// Unique identifier, used for diagnostics only.
	fn id(&self) -> TaskId;

	/// Current progress marker.
	fn position(&self) -> Position;

	/// Launch the task's remaining work, returning one handle per asynchronous unit.
	///
	/// A task may return fewer handles than it has units of work left; the runner then
	/// leaves the phase unfinished and expects an external retrigger.
	fn start(&self) -> Vec<CompletionHandle<E>>;

	/// Cooperatively halt in-flight work. Already-issued completion handles still
	/// resolve on their own.
	async fn stop(&self) -> Result<(), E>;

	/// Release resources owned by the task. Called after `stop`, even when `stop`
	/// failed.
	fn close(&self);
}

impl<E: RunError> fmt::Debug for dyn PipelineTask<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<PipelineTask {}>", self.id())
	}
}

/// Terminal outcome of a single completion handle.
#[derive(Debug)]
pub enum CompletionStatus<E: RunError> {
	/// The unit of work finished successfully.
	Done,
	/// The unit of work failed; the cause aborts the whole job item.
	Failed(E),
	/// The task dropped its signal without resolving it. The runner treats this as a
	/// failure of the unit.
	Dropped,
}

/// Asynchronous handle for one unit of in-flight work inside a started task.
///
/// Exists only for the duration of a phase; never persisted.
#[derive(Debug)]
#[must_use = "a `CompletionHandle` does nothing unless polled"]
pub struct CompletionHandle<E: RunError> {
	task_id: TaskId,
	done_rx: oneshot::Receiver<Result<(), E>>,
}

impl<E: RunError> CompletionHandle<E> {
	/// Create a connected signal/handle pair for one unit of work of the given task.
	#[must_use]
	pub fn channel(task_id: TaskId) -> (CompletionSignal<E>, Self) {
		let (done_tx, done_rx) = oneshot::channel();

		(CompletionSignal { task_id, done_tx }, Self { task_id, done_rx })
	}

	#[must_use]
	pub const fn task_id(&self) -> TaskId {
		self.task_id
	}
}

impl<E: RunError> Future for CompletionHandle<E> {
	type Output = CompletionStatus<E>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let task_id = self.task_id;

		Pin::new(&mut self.done_rx).poll(cx).map(|res| match res {
			Ok(Ok(())) => CompletionStatus::Done,
			Ok(Err(e)) => CompletionStatus::Failed(e),
			Err(_) => {
				warn!(%task_id, "Completion signal dropped before resolving;");
				CompletionStatus::Dropped
			}
		})
	}
}

/// Sending side of a [`CompletionHandle`], owned by the task's in-flight work.
///
/// Resolving is consuming: each unit of work reports exactly once. Dropping the signal
/// without resolving surfaces as [`CompletionStatus::Dropped`] on the handle.
#[derive(Debug)]
pub struct CompletionSignal<E: RunError> {
	task_id: TaskId,
	done_tx: oneshot::Sender<Result<(), E>>,
}

impl<E: RunError> CompletionSignal<E> {
	#[must_use]
	pub const fn task_id(&self) -> TaskId {
		self.task_id
	}

	pub fn succeed(self) {
		if self.done_tx.send(Ok(())).is_err() {
			trace!(task_id = %self.task_id, "Completion handle dropped before success signal;");
		}
	}

	pub fn fail(self, cause: E) {
		if self.done_tx.send(Err(cause)).is_err() {
			warn!(task_id = %self.task_id, "Completion handle dropped before failure signal;");
		}
	}
}

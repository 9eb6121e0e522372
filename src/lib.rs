//!
//! # Data Pipeline Core
//!
//! Core orchestration for two-phase data migration jobs: a bulk "inventory" phase that
//! copies an existing snapshot, followed by a continuous "incremental" phase capturing
//! ongoing changes.
//!
//! One [`InventoryIncrementalTasksRunner`] drives one job item (shard). It launches the
//! not-yet-finished sub-tasks of a phase, fans their in-flight work out into
//! [`CompletionHandle`]s and attaches an observer to each; whichever handle resolves
//! last decides whether the phase advances. Any failing handle marks the job item
//! failed, records the cause against the item and requests a job-wide stop through the
//! [`JobControlClient`] resolved for the job's type.
//!
//! The runner never blocks waiting for tasks and never spawns worker pools of its own;
//! it only reacts to the completions delivered by the tasks it started.
//!
//! ## Basic example
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use data_pipeline_core::{
//!     CompletionHandle, ControlError, InventoryIncrementalTasksRunner, JobControlClient,
//!     JobControlRegistry, JobItemContext, JobItemStatus, JobType, PipelineTask, Position,
//!     TaskId,
//! };
//! use thiserror::Error;
//!
//! #[derive(Debug, Error)]
//! #[error("snapshot copy failed")]
//! struct CopyError;
//!
//! struct NoopControlClient;
//!
//! #[async_trait]
//! impl JobControlClient for NoopControlClient {
//!     async fn persist_job_item_progress(
//!         &self,
//!         _context: &JobItemContext,
//!     ) -> Result<(), ControlError> {
//!         Ok(())
//!     }
//!
//!     async fn update_job_item_status(
//!         &self,
//!         _job_id: &str,
//!         _sharding_item: u16,
//!         _status: JobItemStatus,
//!     ) -> Result<(), ControlError> {
//!         Ok(())
//!     }
//!
//!     async fn persist_job_item_error_message(
//!         &self,
//!         _job_id: &str,
//!         _sharding_item: u16,
//!         _message: &str,
//!     ) -> Result<(), ControlError> {
//!         Ok(())
//!     }
//!
//!     async fn stop(&self, _job_id: &str) -> Result<(), ControlError> {
//!         Ok(())
//!     }
//! }
//!
//! struct FinishedSnapshotTask {
//!     id: TaskId,
//! }
//!
//! #[async_trait]
//! impl PipelineTask<CopyError> for FinishedSnapshotTask {
//!     fn id(&self) -> TaskId {
//!         self.id
//!     }
//!
//!     fn position(&self) -> Position {
//!         Position::Finished
//!     }
//!
//!     fn start(&self) -> Vec<CompletionHandle<CopyError>> {
//!         Vec::new()
//!     }
//!
//!     async fn stop(&self) -> Result<(), CopyError> {
//!         Ok(())
//!     }
//!
//!     fn close(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut registry = JobControlRegistry::new();
//!     registry.register(JobType::Migration, Arc::new(NoopControlClient));
//!
//!     let context = Arc::new(JobItemContext::new("j0101example", 0));
//!
//!     let inventory: Vec<Arc<dyn PipelineTask<CopyError>>> =
//!         vec![Arc::new(FinishedSnapshotTask { id: TaskId::new_v4() })];
//!
//!     let runner =
//!         InventoryIncrementalTasksRunner::new(context, inventory, Vec::new(), &registry)
//!             .expect("migration client is registered");
//!
//!     // Every inventory task is already finished, so this resumes straight into the
//!     // incremental phase (a no-op here, as there are no incremental tasks).
//!     runner.start().await;
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod context;
mod control;
mod error;
mod position;
mod progress;
mod runner;
mod task;

pub use context::{JobItemContext, JobItemStatus};
pub use control::{parse_job_type, JobControlClient, JobControlRegistry, JobType};
pub use error::{ControlError, JobIdError, RunError, RunnerError};
pub use position::Position;
pub use progress::all_inventory_tasks_finished;
pub use runner::{InventoryIncrementalTasksRunner, PipelineTasksRunner};
pub use task::{CompletionHandle, CompletionSignal, CompletionStatus, PipelineTask, TaskId};

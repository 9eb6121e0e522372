use std::sync::Arc;

use super::{error::RunError, task::PipelineTask};

/// Whether every inventory task has reached [`Position::Finished`](super::Position::Finished).
///
/// Vacuously true for an empty collection. Only reads shared task state, so it is safe
/// to call concurrently from scheduler threads and completion observers.
#[must_use]
pub fn all_inventory_tasks_finished<E: RunError>(tasks: &[Arc<dyn PipelineTask<E>>]) -> bool {
	tasks.iter().all(|task| task.position().is_finished())
}

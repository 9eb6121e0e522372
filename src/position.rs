use serde::{Deserialize, Serialize};

/// Opaque progress marker of a sub-task.
///
/// The runner only ever asks whether a position [`is_finished`](Self::is_finished);
/// checkpoint payloads are meaningful solely to the task that produced them and to the
/// control plane that persists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum Position {
	/// The task has not completed any unit of work yet.
	Beginning,
	/// Task-specific checkpoint payload.
	Checkpoint(serde_json::Value),
	/// Every unit of work this task owns is done. A task at this position must never
	/// be started again.
	Finished,
}

impl Position {
	#[must_use]
	pub const fn is_finished(&self) -> bool {
		matches!(self, Self::Finished)
	}
}

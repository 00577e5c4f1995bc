//! Task records exchanged between the coordinator and its workers.

use crate::search::driver::ScoredMove;
use serde::Serialize;

/// One unit of analysis work: a position, a depth and how many lines to
/// return.
#[derive(Clone, Debug, Serialize)]
pub struct Task {
    pub id: String,
    pub fen: String,
    pub depth: u32,
    pub multi_pv: usize,
    /// SAN of the root move this task refines, absent for the root task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_move: Option<String>,
    /// SAN prefix leading from the analysis root to this task's position.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<String>,
}

impl Task {
    pub const ROOT_ID: &'static str = "root";

    pub fn is_root(&self) -> bool {
        self.id == Self::ROOT_ID
    }
}

/// What a worker hands back for one task.
#[derive(Debug)]
pub enum TaskOutcome {
    Result {
        task_id: String,
        lines: Vec<ScoredMove>,
        nodes: u64,
    },
    Error {
        task_id: String,
        message: String,
    },
}

impl TaskOutcome {
    pub fn task_id(&self) -> &str {
        match self {
            TaskOutcome::Result { task_id, .. } | TaskOutcome::Error { task_id, .. } => task_id,
        }
    }
}

//! Analysis worker thread.
//!
//! Each worker owns one `SearchContext` for its whole lifetime, so the
//! transposition table and countermoves stay warm across the tasks it is
//! handed. A panic inside a task is caught and reported as a task error;
//! the worker itself keeps running.

use crate::analysis::task::{Task, TaskOutcome};
use crate::position::Position;
use crate::search::{driver, SearchContext};
use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) fn worker_loop(
    index: usize,
    tasks: Receiver<Task>,
    results: Sender<(usize, TaskOutcome)>,
    stop: Arc<AtomicBool>,
) {
    log::debug!("analysis worker {index} started");
    let mut ctx = SearchContext::with_stop_flag(stop);

    while let Ok(task) = tasks.recv() {
        log::debug!("worker {index} picked up task {}", task.id);
        let outcome = run_task(&mut ctx, &task);
        if results.send((index, outcome)).is_err() {
            // Pool is gone; nobody is listening anymore.
            break;
        }
    }

    log::debug!("analysis worker {index} stopped");
}

fn run_task(ctx: &mut SearchContext, task: &Task) -> TaskOutcome {
    let caught = catch_unwind(AssertUnwindSafe(|| execute(ctx, task)));
    match caught {
        Ok(Ok((lines, nodes))) => TaskOutcome::Result {
            task_id: task.id.clone(),
            lines,
            nodes,
        },
        Ok(Err(err)) => {
            log::warn!("task {} failed: {err:#}", task.id);
            TaskOutcome::Error {
                task_id: task.id.clone(),
                message: format!("{err:#}"),
            }
        }
        Err(_) => {
            log::error!("task {} panicked inside the search", task.id);
            TaskOutcome::Error {
                task_id: task.id.clone(),
                message: "search panicked".to_string(),
            }
        }
    }
}

fn execute(ctx: &mut SearchContext, task: &Task) -> Result<(Vec<driver::ScoredMove>, u64)> {
    ctx.nodes = 0;
    let mut pos = Position::from_fen(&task.fen)?;
    let lines = driver::search_root(ctx, &mut pos, task.depth, task.multi_pv);
    Ok((lines, ctx.nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::STARTPOS_FEN;

    fn task(fen: &str, depth: u32, multi_pv: usize) -> Task {
        Task {
            id: "t".to_string(),
            fen: fen.to_string(),
            depth,
            multi_pv,
            root_move: None,
            moves: Vec::new(),
        }
    }

    #[test]
    fn a_task_produces_lines_and_nodes() {
        let mut ctx = SearchContext::new();
        let outcome = run_task(&mut ctx, &task(STARTPOS_FEN, 1, 3));
        match outcome {
            TaskOutcome::Result { lines, nodes, .. } => {
                assert_eq!(lines.len(), 3);
                assert!(nodes > 0);
            }
            TaskOutcome::Error { message, .. } => panic!("unexpected error: {message}"),
        }
    }

    #[test]
    fn an_invalid_fen_becomes_a_task_error() {
        let mut ctx = SearchContext::new();
        let outcome = run_task(&mut ctx, &task("not a fen", 2, 1));
        assert!(matches!(outcome, TaskOutcome::Error { .. }));
    }
}

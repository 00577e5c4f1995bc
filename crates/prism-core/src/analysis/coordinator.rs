//! Analysis coordination.
//!
//! Fans one position out into a task list, drives the worker pool and
//! folds every settled task back into a ranked set of lines. An update is
//! emitted after each settled task and once more, flagged final, when all
//! tasks are in. Line order may change between emissions; the last one is
//! authoritative.
//!
//! `start` blocks until every task settles, but the coordinator is
//! sharable: `stop` takes `&self` and may be called from another thread
//! mid-run, which raises the pool's stop flag, cancels the queue and
//! lets `start` return promptly with whatever had settled.

use crate::analysis::palette;
use crate::analysis::plan;
use crate::analysis::pool::WorkerPool;
use crate::analysis::task::{Task, TaskOutcome};
use anyhow::Result;
use crossbeam_channel::Select;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// One ranked line of the aggregated analysis.
#[derive(Clone, Debug, Serialize)]
pub struct Line {
    /// SAN of the root move this line starts with.
    pub root_move: String,
    /// Score from the perspective of the side to move at the analysis
    /// root.
    pub score: i32,
    /// SAN continuation, starting with the root move.
    pub moves: SmallVec<[String; 4]>,
    /// Display color, stable within one emission.
    pub color: &'static str,
    /// Number of settled tasks that refined this root move.
    pub plans: u32,
    /// Depth of the deepest task that shaped the line.
    pub depth: u32,
}

/// Progress counters attached to every emission.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Stats {
    pub nodes: u64,
    pub nps: u64,
    pub elapsed: f64,
    /// Tasks settled so far.
    pub tasks: usize,
    /// Upper bound of the plan budget.
    pub total: usize,
    #[serde(rename = "final")]
    pub finished: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct CoordinatorConfig {
    pub worker_count: usize,
    pub max_plans: usize,
    pub max_depth: u32,
    /// Ranked lines requested from the root plan.
    pub multi_pv: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            max_plans: 64,
            max_depth: 4,
            multi_pv: 8,
        }
    }
}

struct TaskSlot {
    task: Task,
    outcome: Option<TaskOutcome>,
}

type UpdateCallback = Box<dyn FnMut(&[Line], &Stats) + Send>;

pub struct Coordinator {
    config: CoordinatorConfig,
    on_update: Mutex<UpdateCallback>,
    pool: Mutex<Option<WorkerPool>>,
}

/// Locks a mutex, recovering the guard when a holder panicked.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("coordinator state mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        on_update: impl FnMut(&[Line], &Stats) + Send + 'static,
    ) -> Self {
        Self {
            config,
            on_update: Mutex::new(Box::new(on_update)),
            pool: Mutex::new(None),
        }
    }

    /// Runs one full analysis of `fen`, emitting an update per settled
    /// task, and returns the final ranking.
    ///
    /// A concurrent `stop` cancels the run: queued tasks settle as
    /// cancelled, running searches abandon their trees, and the final
    /// emission still fires.
    pub fn start(&self, fen: &str) -> Result<(Vec<Line>, Stats)> {
        self.stop();

        let plans = plan::generate(
            fen,
            self.config.max_plans,
            self.config.max_depth,
            self.config.multi_pv,
        )?;
        log::info!(
            "analysing {fen}: {} plans across {} workers",
            plans.len(),
            self.config.worker_count
        );

        let started = Instant::now();
        let mut slots: Vec<TaskSlot> = Vec::with_capacity(plans.len());

        // The pool is published before dispatch so a concurrent stop can
        // reach it; dispatch holds the lock, keeping the task order
        // intact.
        let receipts = {
            let mut guard = lock_or_recover(&self.pool);
            let pool = guard.insert(WorkerPool::new(self.config.worker_count));
            let mut receipts = Vec::with_capacity(plans.len());
            for task in plans {
                receipts.push(pool.dispatch(task.clone()));
                slots.push(TaskSlot {
                    task,
                    outcome: None,
                });
            }
            receipts
        };

        let mut select = Select::new();
        for receipt in &receipts {
            select.recv(receipt.receiver());
        }

        let mut total_nodes = 0u64;
        let mut settled = 0usize;

        while settled < receipts.len() {
            let operation = select.select();
            let index = operation.index();
            let outcome = match operation.recv(receipts[index].receiver()) {
                Ok(outcome) => outcome,
                Err(_) => TaskOutcome::Error {
                    task_id: slots[index].task.id.clone(),
                    message: "task cancelled".to_string(),
                },
            };
            select.remove(index);

            if let TaskOutcome::Result { nodes, .. } = &outcome {
                total_nodes += nodes;
            }
            slots[index].outcome = Some(outcome);
            settled += 1;

            self.emit(&slots, total_nodes, started, settled, false);
        }

        let (lines, stats) = self.emit(&slots, total_nodes, started, settled, true);
        log::info!(
            "analysis finished: {} lines, {} nodes in {:.2}s",
            lines.len(),
            stats.nodes,
            stats.elapsed
        );

        Ok((lines, stats))
    }

    /// Terminates the pool and marks the coordinator idle. Callable from
    /// any thread; in-flight results arriving afterwards are discarded.
    pub fn stop(&self) {
        if let Some(mut pool) = lock_or_recover(&self.pool).take() {
            pool.terminate();
            log::info!("analysis stopped");
        }
    }

    fn stats(&self, nodes: u64, started: Instant, settled: usize, finished: bool) -> Stats {
        let elapsed = started.elapsed().as_secs_f64();
        let nps = if elapsed > 0.0 {
            (nodes as f64 / elapsed).round() as u64
        } else {
            0
        };
        Stats {
            nodes,
            nps,
            elapsed,
            tasks: settled,
            total: self.config.max_plans,
            finished,
        }
    }

    /// Rebuilds the ranked line set from every settled task and hands it
    /// to the update callback.
    fn emit(
        &self,
        slots: &[TaskSlot],
        nodes: u64,
        started: Instant,
        settled: usize,
        finished: bool,
    ) -> (Vec<Line>, Stats) {
        let mut lines: Vec<Line> = Vec::new();
        let mut by_root: HashMap<String, usize> = HashMap::new();
        let mut plans_per_root: HashMap<String, u32> = HashMap::new();
        let mut color_index = 0usize;

        // The root task seeds one line per returned root move.
        if let Some(slot) = slots.iter().find(|s| s.task.is_root()) {
            if let Some(TaskOutcome::Result { lines: root_lines, .. }) = &slot.outcome {
                for scored in root_lines {
                    let san = scored.mv.san.clone();
                    by_root.insert(san.clone(), lines.len());
                    lines.push(Line {
                        root_move: san.clone(),
                        score: scored.score,
                        moves: SmallVec::from_vec(vec![san]),
                        color: palette::color_for(color_index),
                        plans: 0,
                        depth: slot.task.depth,
                    });
                    color_index += 1;
                }
            }
        }

        // Derivative tasks refine or create lines for their root move.
        for slot in slots.iter().filter(|s| !s.task.is_root()) {
            let Some(TaskOutcome::Result { lines: task_lines, .. }) = &slot.outcome else {
                continue;
            };
            let Some(best) = task_lines.first() else {
                continue;
            };
            let Some(root_move) = slot.task.root_move.clone() else {
                continue;
            };

            // Child scores come from the side to move at the task's
            // position; an odd prefix length flips them back to the root's
            // perspective.
            let score = if slot.task.moves.len() % 2 == 1 {
                -best.score
            } else {
                best.score
            };

            match by_root.get(&root_move) {
                None => {
                    let mut moves: SmallVec<[String; 4]> =
                        SmallVec::from_vec(slot.task.moves.clone());
                    moves.push(best.mv.san.clone());
                    by_root.insert(root_move.clone(), lines.len());
                    lines.push(Line {
                        root_move: root_move.clone(),
                        score,
                        moves,
                        color: palette::color_for(color_index),
                        plans: 0,
                        depth: slot.task.depth,
                    });
                    color_index += 1;
                }
                Some(&index) => {
                    let line = &mut lines[index];
                    // A deeper prefix that agrees with the line so far
                    // contributes its best reply as the next move.
                    let extends = slot.task.moves.len() >= line.moves.len()
                        && line
                            .moves
                            .iter()
                            .zip(slot.task.moves.iter())
                            .all(|(a, b)| a == b)
                        && line.moves.last() != Some(&best.mv.san);
                    if extends {
                        line.moves.push(best.mv.san.clone());
                    }
                }
            }

            *plans_per_root.entry(root_move).or_insert(0) += 1;
        }

        for line in &mut lines {
            line.plans = plans_per_root.get(&line.root_move).copied().unwrap_or(0);
        }
        lines.sort_by(|a, b| b.score.cmp(&a.score));

        let stats = self.stats(nodes, started, settled, finished);
        let mut on_update = lock_or_recover(&self.on_update);
        (*on_update)(&lines, &stats);
        (lines, stats)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Fixed-size worker pool with a FIFO task queue.
//!
//! `dispatch` returns a receipt that settles with the task's outcome. A
//! dispatcher thread assigns queued tasks to idle workers in index order,
//! both on submission and whenever a worker reports back. Termination
//! drains the queue; receipts of cancelled tasks settle with an error on
//! wait.

use crate::analysis::task::{Task, TaskOutcome};
use crate::analysis::worker;
use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

enum PoolCommand {
    Submit(Task, Sender<TaskOutcome>),
    Terminate,
}

/// Pending delivery of one task's outcome.
pub struct TaskReceipt {
    rx: Receiver<TaskOutcome>,
}

impl TaskReceipt {
    /// Blocks until the task settles. Errors when the pool was terminated
    /// before the task ran.
    pub fn wait(&self) -> Result<TaskOutcome> {
        self.rx
            .recv()
            .context("worker pool terminated before the task settled")
    }

    pub(crate) fn receiver(&self) -> &Receiver<TaskOutcome> {
        &self.rx
    }
}

pub struct WorkerPool {
    commands: Sender<PoolCommand>,
    dispatcher: Option<JoinHandle<()>>,
    size: usize,
    stop: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (command_tx, command_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let mut inputs = Vec::with_capacity(size);
        for index in 0..size {
            let (task_tx, task_rx) = unbounded::<Task>();
            let results = result_tx.clone();
            let stop = stop.clone();
            thread::spawn(move || worker::worker_loop(index, task_rx, results, stop));
            inputs.push(task_tx);
        }
        drop(result_tx);

        let dispatcher = thread::spawn(move || dispatch_loop(command_rx, result_rx, inputs));

        Self {
            commands: command_tx,
            dispatcher: Some(dispatcher),
            size,
            stop,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queues the task and returns its receipt.
    pub fn dispatch(&self, task: Task) -> TaskReceipt {
        let (tx, rx) = bounded(1);
        if self.commands.send(PoolCommand::Submit(task, tx)).is_err() {
            log::warn!("dispatch on a terminated pool");
        }
        TaskReceipt { rx }
    }

    /// Stops the dispatcher and cancels the queue. The shared stop flag
    /// makes busy workers abandon their current search; late results are
    /// discarded.
    pub fn terminate(&mut self) {
        self.stop.store(true, Ordering::Release);
        if self.dispatcher.is_some() {
            let _ = self.commands.send(PoolCommand::Terminate);
        }
        if let Some(handle) = self.dispatcher.take() {
            if handle.join().is_err() {
                log::error!("pool dispatcher panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn dispatch_loop(
    commands: Receiver<PoolCommand>,
    results: Receiver<(usize, TaskOutcome)>,
    inputs: Vec<Sender<Task>>,
) {
    let mut pending: VecDeque<(Task, Sender<TaskOutcome>)> = VecDeque::new();
    let mut in_flight: Vec<Option<Sender<TaskOutcome>>> = vec![None; inputs.len()];

    loop {
        select! {
            recv(commands) -> command => match command {
                Ok(PoolCommand::Submit(task, reply)) => {
                    pending.push_back((task, reply));
                    assign_pending(&mut pending, &mut in_flight, &inputs);
                }
                Ok(PoolCommand::Terminate) | Err(_) => break,
            },
            recv(results) -> message => match message {
                Ok((index, outcome)) => {
                    log::debug!("worker {index} settled task {}", outcome.task_id());
                    if let Some(reply) = in_flight[index].take() {
                        let _ = reply.send(outcome);
                    }
                    assign_pending(&mut pending, &mut in_flight, &inputs);
                }
                Err(_) => break,
            },
        }
    }
    // Dropping the task senders stops the workers; dropping queued
    // resolvers cancels their receipts.
}

fn assign_pending(
    pending: &mut VecDeque<(Task, Sender<TaskOutcome>)>,
    in_flight: &mut [Option<Sender<TaskOutcome>>],
    inputs: &[Sender<Task>],
) {
    for index in 0..inputs.len() {
        if pending.is_empty() {
            return;
        }
        if in_flight[index].is_some() {
            continue;
        }
        if let Some((task, reply)) = pending.pop_front() {
            if inputs[index].send(task).is_ok() {
                in_flight[index] = Some(reply);
            }
            // A dead worker drops the reply sender, which settles the
            // receipt as cancelled.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::STARTPOS_FEN;

    fn quick_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            fen: STARTPOS_FEN.to_string(),
            depth: 1,
            multi_pv: 1,
            root_move: None,
            moves: Vec::new(),
        }
    }

    #[test]
    fn every_submitted_task_settles_exactly_once() {
        let pool = WorkerPool::new(2);
        let receipts: Vec<_> = (0..6).map(|i| pool.dispatch(quick_task(&format!("t{i}")))).collect();
        let mut ids = Vec::new();
        for receipt in &receipts {
            let outcome = receipt.wait().expect("task settles");
            assert!(matches!(outcome, TaskOutcome::Result { .. }));
            ids.push(outcome.task_id().to_string());
        }
        ids.sort();
        assert_eq!(ids, ["t0", "t1", "t2", "t3", "t4", "t5"]);
    }

    #[test]
    fn failing_tasks_settle_with_an_error() {
        let pool = WorkerPool::new(1);
        let mut bad = quick_task("bad");
        bad.fen = "garbage".to_string();
        let outcome = pool.dispatch(bad).wait().expect("task settles");
        assert!(matches!(outcome, TaskOutcome::Error { .. }));
    }

    #[test]
    fn termination_cancels_queued_tasks() {
        let mut pool = WorkerPool::new(1);
        // Enough queued work that some of it cannot have started yet.
        let receipts: Vec<_> = (0..8)
            .map(|i| pool.dispatch(quick_task(&format!("q{i}"))))
            .collect();
        pool.terminate();
        // Every receipt settles promptly, as a result or as cancelled;
        // none may hang.
        for receipt in &receipts {
            let _ = receipt.wait();
        }
        // After termination new dispatches settle as cancelled.
        let late = pool.dispatch(quick_task("late"));
        assert!(late.wait().is_err());
    }
}

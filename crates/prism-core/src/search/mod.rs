//! Single-position search core.

pub mod alpha_beta;
pub mod constants;
pub mod driver;
pub mod heuristics;
pub mod ordering;
pub mod tt;

use heuristics::{CounterMoveTable, HistoryTable, KillerTable, LmrTable, MoveStack};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tt::TranspositionTable;

/// All mutable state of one search worker.
///
/// Owned by exactly one worker and passed by reference through the
/// recursion; nothing here is shared between workers except the stop
/// flag. The transposition table and countermoves persist across root
/// searches, the rest is reset per root search.
pub struct SearchContext {
    pub tt: TranspositionTable,
    pub counters: CounterMoveTable,
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub move_stack: MoveStack,
    pub lmr: LmrTable,
    pub nodes: u64,
    stop: Arc<AtomicBool>,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::with_stop_flag(Arc::new(AtomicBool::new(false)))
    }

    /// Context whose searches abort once `stop` is raised by another
    /// thread.
    pub fn with_stop_flag(stop: Arc<AtomicBool>) -> Self {
        Self {
            tt: TranspositionTable::new(),
            counters: CounterMoveTable::new(),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            move_stack: MoveStack::new(),
            lmr: LmrTable::new(),
            nodes: 0,
            stop,
        }
    }

    /// True once the owner of the stop flag requested cancellation.
    /// Results produced after that point are partial and are discarded
    /// by the caller.
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Per-root-search reset: killers and the move stack clear, history
    /// decays by gravity on entry.
    pub fn begin_root_search(&mut self) {
        self.killers.clear();
        self.move_stack.clear();
        self.history.decay();
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}

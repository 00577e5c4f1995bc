//! Move-ordering heuristic tables.
//!
//! Killers and the move stack are cleared per root search, the history
//! table decays by gravity, and countermoves persist for the lifetime of
//! the owning worker.

use crate::position::{MoveKey, PieceKey};
use crate::search::constants::MAX_PLY;

/// Two killer slots per ply with most-recent-first displacement.
pub struct KillerTable {
    slots: Vec<[Option<MoveKey>; 2]>,
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: vec![[None; 2]; MAX_PLY],
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = [None; 2];
        }
    }

    pub fn insert(&mut self, ply: usize, key: MoveKey) {
        if ply >= MAX_PLY {
            return;
        }
        let slot = &mut self.slots[ply];
        if slot[0] != Some(key) {
            slot[1] = slot[0];
            slot[0] = Some(key);
        }
    }

    pub fn matches(&self, ply: usize, key: MoveKey) -> bool {
        ply < MAX_PLY && self.slots[ply].contains(&Some(key))
    }
}

fn piece_index(key: PieceKey) -> usize {
    let (role, from, to) = key;
    (role as usize - 1) * 64 * 64 + usize::from(from) * 64 + usize::from(to)
}

/// Accumulates cutoff contributions of quiet moves, keyed by piece, from
/// and to.
pub struct HistoryTable {
    scores: Vec<i32>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            scores: vec![0; 6 * 64 * 64],
        }
    }

    pub fn get(&self, key: PieceKey) -> i32 {
        self.scores[piece_index(key)]
    }

    pub fn add(&mut self, key: PieceKey, amount: i32) {
        let score = &mut self.scores[piece_index(key)];
        *score = score.saturating_add(amount);
    }

    /// Gravity: halve every entry, letting stale ones fade to zero.
    pub fn decay(&mut self) {
        for score in &mut self.scores {
            *score /= 2;
        }
    }
}

/// The quiet reply that last refuted each opponent move.
pub struct CounterMoveTable {
    table: Vec<Option<PieceKey>>,
}

impl CounterMoveTable {
    pub fn new() -> Self {
        Self {
            table: vec![None; 6 * 64 * 64],
        }
    }

    pub fn get(&self, parent: PieceKey) -> Option<PieceKey> {
        self.table[piece_index(parent)]
    }

    pub fn set(&mut self, parent: PieceKey, reply: PieceKey) {
        self.table[piece_index(parent)] = Some(reply);
    }
}

/// Moves made on the path from the root, indexed by ply.
pub struct MoveStack {
    made: Vec<Option<PieceKey>>,
}

impl MoveStack {
    pub fn new() -> Self {
        Self {
            made: vec![None; MAX_PLY],
        }
    }

    pub fn clear(&mut self) {
        for entry in &mut self.made {
            *entry = None;
        }
    }

    pub fn set(&mut self, ply: usize, key: PieceKey) {
        if ply < MAX_PLY {
            self.made[ply] = Some(key);
        }
    }

    /// Move that led to the node at `ply`.
    pub fn parent_of(&self, ply: usize) -> Option<PieceKey> {
        if ply == 0 || ply > MAX_PLY {
            None
        } else {
            self.made[ply - 1]
        }
    }
}

/// Precomputed late-move reduction amounts by depth and move index.
pub struct LmrTable {
    reductions: [[i32; 64]; 32],
}

impl LmrTable {
    pub fn new() -> Self {
        let mut reductions = [[0; 64]; 32];
        for (depth, row) in reductions.iter_mut().enumerate().skip(1) {
            for (index, r) in row.iter_mut().enumerate().skip(1) {
                let raw = 0.75 + (depth as f64).ln() * ((index + 1) as f64).ln() / 2.25;
                *r = (raw.floor() as i32).max(1);
            }
        }
        Self { reductions }
    }

    pub fn reduction(&self, depth: i32, move_index: usize) -> i32 {
        let d = (depth.max(0) as usize).min(31);
        let m = move_index.min(63);
        self.reductions[d][m]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Role, Square};

    /// Builds a piece key without a real move.
    fn key(role: Role, from: Square, to: Square) -> PieceKey {
        (role, from, to)
    }

    #[test]
    fn killers_displace_the_older_slot() {
        let mut killers = KillerTable::new();
        let a = (Square::E2, Square::E4);
        let b = (Square::D2, Square::D4);
        let c = (Square::G1, Square::F3);

        killers.insert(3, a);
        killers.insert(3, b);
        assert!(killers.matches(3, a));
        assert!(killers.matches(3, b));

        killers.insert(3, c);
        assert!(killers.matches(3, b));
        assert!(killers.matches(3, c));
        assert!(!killers.matches(3, a));

        // Re-inserting the newest killer must not duplicate it.
        killers.insert(3, c);
        assert!(killers.matches(3, b));
    }

    #[test]
    fn history_decay_halves_and_fades() {
        let mut history = HistoryTable::new();
        let k = key(Role::Knight, Square::G1, Square::F3);
        history.add(k, 9);
        history.decay();
        assert_eq!(history.get(k), 4);
        history.decay();
        history.decay();
        assert_eq!(history.get(k), 1);
        history.decay();
        assert_eq!(history.get(k), 0);
    }

    #[test]
    fn countermoves_remember_the_latest_refutation() {
        let mut counters = CounterMoveTable::new();
        let parent = key(Role::Pawn, Square::E2, Square::E4);
        let reply = key(Role::Pawn, Square::E7, Square::E5);
        let newer = key(Role::Knight, Square::B8, Square::C6);

        assert_eq!(counters.get(parent), None);
        counters.set(parent, reply);
        assert_eq!(counters.get(parent), Some(reply));
        counters.set(parent, newer);
        assert_eq!(counters.get(parent), Some(newer));
    }

    #[test]
    fn move_stack_exposes_the_parent_move() {
        let mut stack = MoveStack::new();
        let first = key(Role::Pawn, Square::E2, Square::E4);
        stack.set(0, first);
        assert_eq!(stack.parent_of(0), None);
        assert_eq!(stack.parent_of(1), Some(first));
        stack.clear();
        assert_eq!(stack.parent_of(1), None);
    }

    #[test]
    fn lmr_table_shape() {
        let lmr = LmrTable::new();
        assert_eq!(lmr.reduction(0, 10), 0);
        assert_eq!(lmr.reduction(10, 0), 0);
        assert!(lmr.reduction(3, 4) >= 1);
        assert!(lmr.reduction(20, 40) >= lmr.reduction(3, 4));
        // Out-of-range arguments clamp instead of panicking.
        assert!(lmr.reduction(100, 500) >= 1);
    }
}

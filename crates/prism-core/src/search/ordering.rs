//! Composite move ordering.
//!
//! Higher scores search first. Captures dominate through MVV/LVA, the
//! hash move gets a flat bonus and quiet moves fall back to killers,
//! countermoves and history. Sorting is stable so equal scores keep the
//! generator's move order.

use crate::eval::pst::piece_value;
use crate::position::{EngineMove, MoveKey, PieceKey};
use crate::search::heuristics::{CounterMoveTable, HistoryTable, KillerTable};

const HASH_MOVE_BONUS: i32 = 300;
const KILLER_BONUS: i32 = 90;
const COUNTERMOVE_BONUS: i32 = 75;
const HISTORY_CAP: i32 = 80;

pub struct OrderingTables<'a> {
    pub killers: &'a KillerTable,
    pub counters: &'a CounterMoveTable,
    pub history: &'a HistoryTable,
}

pub fn sort_moves(
    moves: &mut [EngineMove],
    tt_move: Option<MoveKey>,
    parent: Option<PieceKey>,
    tables: &OrderingTables<'_>,
    ply: usize,
) {
    let countermove = parent.and_then(|p| tables.counters.get(p));
    moves.sort_by_key(|m| -composite_score(m, tt_move, countermove, tables, ply));
}

fn composite_score(
    m: &EngineMove,
    tt_move: Option<MoveKey>,
    countermove: Option<PieceKey>,
    tables: &OrderingTables<'_>,
    ply: usize,
) -> i32 {
    let mut score = 0;
    if tt_move == Some(m.key()) {
        score += HASH_MOVE_BONUS;
    }
    if let Some(victim) = m.capture {
        score += 10 * piece_value(victim) - piece_value(m.role);
    }
    if let Some(promotion) = m.promotion {
        score += 8 * piece_value(promotion);
    }
    if tables.killers.matches(ply, m.key()) {
        score += KILLER_BONUS;
    }
    if m.is_quiet() {
        if countermove == Some(m.piece_key()) {
            score += COUNTERMOVE_BONUS;
        }
        score += (tables.history.get(m.piece_key()) / 100).min(HISTORY_CAP);
    }
    score
}

/// Capture and promotion weight used by the quiescence sort.
pub fn tactical_score(m: &EngineMove) -> i32 {
    let mut score = 0;
    if let Some(victim) = m.capture {
        score += 10 * piece_value(victim) - piece_value(m.role);
    }
    if let Some(promotion) = m.promotion {
        score += 8 * piece_value(promotion);
    }
    score
}

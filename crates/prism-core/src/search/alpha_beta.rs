//! Main alpha-beta search and quiescence.
//!
//! Negamax with scores relative to the side to move. Pruning order at each
//! node: mate-distance bounds, hash probe, horizon hand-off to quiescence,
//! terminal verdict, null move, razoring, then the move loop with
//! futility, late-move pruning, reductions and principal-variation
//! null windows.

use crate::eval;
use crate::eval::pst::piece_value;
use crate::position::Position;
use crate::search::constants::*;
use crate::search::ordering::{self, OrderingTables};
use crate::search::tt::Bound;
use crate::search::SearchContext;
use shakmaty::Color;

pub struct Search<'a> {
    pub ctx: &'a mut SearchContext,
}

impl Search<'_> {
    pub fn new(ctx: &mut SearchContext) -> Search<'_> {
        Search { ctx }
    }

    /// Evaluation from the side to move's point of view.
    fn relative_eval(&self, pos: &Position) -> i32 {
        match pos.turn() {
            Color::White => eval::evaluate(pos),
            Color::Black => -eval::evaluate(pos),
        }
    }

    fn relative_eval_static(&self, pos: &Position) -> i32 {
        match pos.turn() {
            Color::White => eval::evaluate_static(pos),
            Color::Black => -eval::evaluate_static(pos),
        }
    }

    pub fn alpha_beta(
        &mut self,
        pos: &mut Position,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
    ) -> i32 {
        if self.ctx.should_stop() {
            return 0;
        }

        self.ctx.nodes += 1;

        // Mate-distance pruning: nothing beyond these bounds is reachable
        // from this ply.
        alpha = alpha.max(-(MATE_SCORE - ply as i32));
        beta = beta.min(MATE_SCORE - ply as i32);
        if alpha >= beta {
            return alpha;
        }

        let key = pos.zobrist();
        if let Some(score) = self.ctx.tt.probe(key, depth, alpha, beta) {
            return score;
        }

        if depth <= 0 {
            return self.quiescence(pos, alpha, beta, ply);
        }

        if pos.is_terminal() {
            return self.relative_eval(pos);
        }

        let in_check = pos.in_check();

        // Null move: hand the opponent a free tempo and see whether the
        // position still clears beta at reduced depth.
        if !in_check && depth >= NULL_MOVE_REDUCTION + 1 {
            if let Some(mut passed) = pos.passed_turn() {
                if !passed.in_check() {
                    let score = -self.alpha_beta(
                        &mut passed,
                        depth - 1 - NULL_MOVE_REDUCTION,
                        -beta,
                        -alpha,
                        ply + 1,
                    );
                    if score >= beta {
                        return beta;
                    }
                }
            }
        }

        let static_eval = if !in_check && depth <= 3 {
            self.relative_eval_static(pos)
        } else {
            0
        };

        // Razoring is armed on white-to-move nodes only.
        if !in_check && pos.turn() == Color::White && (depth == 1 || depth == 2) {
            if static_eval + RAZOR_MARGIN[depth as usize] < alpha {
                let score = self.quiescence(pos, alpha - 1, alpha, ply);
                if score < alpha {
                    return score;
                }
            }
        }

        let tt_move = self.ctx.tt.probe_move(key);
        let parent = self.ctx.move_stack.parent_of(ply);
        let mut moves = pos.legal_moves_fast();
        if moves.is_empty() {
            return self.relative_eval(pos);
        }
        {
            let tables = OrderingTables {
                killers: &self.ctx.killers,
                counters: &self.ctx.counters,
                history: &self.ctx.history,
            };
            ordering::sort_moves(&mut moves, tt_move, parent, &tables, ply);
        }

        let original_alpha = alpha;
        let mut best = -INFINITY;
        let mut best_move = None;
        let mut searched = 0usize;
        let mut quiet_count = 0;

        for (mi, m) in moves.iter().enumerate() {
            let quiet = m.is_quiet();

            if quiet && !in_check && searched > 0 {
                if depth <= 3 && static_eval + FUTILITY_MARGIN[depth as usize] <= alpha {
                    continue;
                }
                if depth <= 2 {
                    quiet_count += 1;
                    if quiet_count > LMP_THRESHOLD[depth as usize] {
                        continue;
                    }
                }
            }

            self.ctx.move_stack.set(ply, m.piece_key());
            pos.make(m);
            let gives_check = pos.in_check();
            let new_depth = depth - 1;

            let score = if searched == 0 {
                -self.alpha_beta(pos, new_depth, -beta, -alpha, ply + 1)
            } else if quiet && !gives_check && !in_check && depth >= 3 && mi >= 2 {
                // Reduced null-window probe first, full re-search only when
                // the probe lands strictly inside the window.
                let r = self.ctx.lmr.reduction(depth, mi).min(new_depth);
                let mut s = -self.alpha_beta(pos, new_depth - r, -(alpha + 1), -alpha, ply + 1);
                if s > alpha && s < beta {
                    s = -self.alpha_beta(pos, new_depth, -beta, -alpha, ply + 1);
                }
                s
            } else {
                let mut s = -self.alpha_beta(pos, new_depth, -(alpha + 1), -alpha, ply + 1);
                if s > alpha && s < beta {
                    s = -self.alpha_beta(pos, new_depth, -beta, -alpha, ply + 1);
                }
                s
            };

            pos.unmake();
            searched += 1;

            if self.ctx.should_stop() {
                return best;
            }

            if score > best {
                best = score;
                best_move = Some(m.key());
            }
            if score > alpha {
                alpha = score;
                if quiet {
                    self.ctx.history.add(m.piece_key(), depth);
                }
            }
            if alpha >= beta {
                if quiet {
                    self.ctx.killers.insert(ply, m.key());
                    self.ctx.history.add(m.piece_key(), depth * depth);
                    if let Some(parent_key) = parent {
                        self.ctx.counters.set(parent_key, m.piece_key());
                    }
                }
                break;
            }
        }

        let bound = if best >= beta {
            Bound::Lower
        } else if best <= original_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.ctx.tt.store(key, depth, best, bound, best_move);
        best
    }

    /// Tactical-only recursion that stabilises the horizon.
    ///
    /// In check every evasion is searched; otherwise only captures and
    /// promotions, under the stand-pat bound. The mobility term stays out
    /// of the evaluation here.
    pub fn quiescence(&mut self, pos: &mut Position, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.ctx.should_stop() {
            return 0;
        }

        self.ctx.nodes += 1;

        let in_check = pos.in_check();
        let mut stand_pat = -INFINITY;
        if !in_check {
            stand_pat = self.relative_eval_static(pos);
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
        }

        let mut moves = pos.legal_moves_fast();
        if in_check {
            if moves.is_empty() {
                return -MATE_SCORE;
            }
        } else {
            moves.retain(|m| m.is_capture() || m.is_promotion());
        }
        moves.sort_by_key(|m| -ordering::tactical_score(m));

        for m in &moves {
            if !in_check {
                if let Some(victim) = m.capture {
                    // Delta pruning: even winning the piece cannot reach
                    // alpha.
                    if stand_pat + piece_value(victim) + DELTA_MARGIN < alpha {
                        continue;
                    }
                }
            }

            pos.make(m);
            let score = -self.quiescence(pos, -beta, -alpha, ply + 1);
            pos.unmake();

            if score >= beta {
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

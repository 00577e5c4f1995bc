//! Iterative-deepening root driver with aspiration windows and multi-PV.

use crate::position::{EngineMove, Position};
use crate::search::alpha_beta::Search;
use crate::search::constants::*;
use crate::search::SearchContext;

/// One root move with its score from the root side's perspective.
#[derive(Clone, Debug)]
pub struct ScoredMove {
    pub mv: EngineMove,
    pub score: i32,
}

/// Searches every root move to `max_depth` and returns the best
/// `multi_pv` of them, sorted by descending score.
///
/// Killers and the move stack are cleared and the history table decays on
/// entry; the transposition table and countermoves carry over from the
/// worker's previous searches. A terminal root yields an empty list, and
/// a raised stop flag cuts the loop short with whatever was scored so
/// far.
pub fn search_root(
    ctx: &mut SearchContext,
    pos: &mut Position,
    max_depth: u32,
    multi_pv: usize,
) -> Vec<ScoredMove> {
    ctx.begin_root_search();

    let moves = pos.legal_moves();
    let mut scored = Vec::with_capacity(moves.len());

    for m in moves {
        if ctx.should_stop() {
            break;
        }
        pos.make(&m);
        let score = deepen(ctx, pos, max_depth);
        pos.unmake();
        scored.push(ScoredMove { mv: m, score });
    }

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(multi_pv);
    scored
}

/// Iterative deepening over one root move's child position. The returned
/// score is from the root side's perspective.
fn deepen(ctx: &mut SearchContext, child: &mut Position, max_depth: u32) -> i32 {
    let mut previous = 0;

    for depth in 1..=max_depth.max(1) as i32 {
        if ctx.should_stop() {
            break;
        }
        let score = if depth == 1 {
            let mut search = Search::new(ctx);
            -search.alpha_beta(child, depth, -INFINITY, INFINITY, 0)
        } else {
            aspiration(ctx, child, depth, previous)
        };
        previous = score;

        // A forced mate will not change with more depth.
        if score.abs() >= MATE_BOUND {
            break;
        }
    }

    previous
}

/// Searches around the previous iteration's score, widening on a miss and
/// falling back to the full window.
fn aspiration(ctx: &mut SearchContext, child: &mut Position, depth: i32, previous: i32) -> i32 {
    for half_width in [ASPIRATION_WINDOW, ASPIRATION_WIDE] {
        let lo = previous - half_width;
        let hi = previous + half_width;
        let mut search = Search::new(ctx);
        let score = -search.alpha_beta(child, depth, -hi, -lo, 0);
        if score > lo && score < hi {
            return score;
        }
    }
    let mut search = Search::new(ctx);
    -search.alpha_beta(child, depth, -INFINITY, INFINITY, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_prefers_a_center_move() {
        let mut ctx = SearchContext::new();
        let mut pos = Position::startpos();
        let lines = search_root(&mut ctx, &mut pos, 1, 3);
        assert_eq!(lines.len(), 3);
        let top = &lines[0];
        assert!(
            ["e4", "d4", "Nf3", "c4"].contains(&top.mv.san.as_str()),
            "unexpected top move {}",
            top.mv.san
        );
        assert!(top.score.abs() < 100);
        assert!(lines.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn mate_in_one_is_found_and_scored_as_mate() {
        let mut ctx = SearchContext::new();
        let mut pos =
            Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").expect("valid FEN");
        let lines = search_root(&mut ctx, &mut pos, 2, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].mv.san, "Ra8#");
        assert!(lines[0].score >= MATE_BOUND);
    }

    #[test]
    fn terminal_root_yields_no_lines() {
        let mut ctx = SearchContext::new();
        let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("valid FEN");
        let lines = search_root(&mut ctx, &mut pos, 3, 4);
        assert!(lines.is_empty());
    }

    #[test]
    fn repeated_searches_agree_on_the_best_move() {
        let mut ctx = SearchContext::new();
        let mut pos = Position::startpos();
        let first = search_root(&mut ctx, &mut pos, 3, 1);
        let second = search_root(&mut ctx, &mut pos, 3, 1);
        assert_eq!(first[0].mv.san, second[0].mv.san);
    }

    #[test]
    fn scores_flip_with_the_side_to_move() {
        // White is up a rook; from black's perspective the same material
        // balance must score negative.
        let mut ctx = SearchContext::new();
        let mut white_pos =
            Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").expect("valid FEN");
        let white_lines = search_root(&mut ctx, &mut white_pos, 2, 1);

        let mut ctx2 = SearchContext::new();
        let mut black_pos =
            Position::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").expect("valid FEN");
        let black_lines = search_root(&mut ctx2, &mut black_pos, 2, 1);

        assert!(white_lines[0].score > 300);
        assert!(black_lines[0].score < -300);
    }
}

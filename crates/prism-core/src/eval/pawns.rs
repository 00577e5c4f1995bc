//! Pawn-structure evaluation.
//!
//! Works from per-file pawn lists built in one board scan. Scores are
//! white-positive; every fractional term is rounded before it is summed.

use shakmaty::{Bitboard, Color, Square};

/// Bonus by 0-based rank for a passed pawn, from white's perspective.
const PASSED_BONUS: [i32; 8] = [0, 0, 10, 20, 35, 55, 80, 120];

/// Bonus by 0-based rank for a candidate passed pawn.
const CANDIDATE_BONUS: [i32; 8] = [0, 0, 5, 10, 20, 35, 0, 0];

const DOUBLED_PENALTY: i32 = 25;
const ISOLATED_PENALTY: i32 = 20;
const BACKWARD_PENALTY: i32 = 15;
const CHAIN_BONUS: i32 = 10;
const CONNECTED_BONUS: i32 = 8;

pub struct PawnReport {
    pub score: i32,
    pub passed_white: Vec<Square>,
    pub passed_black: Vec<Square>,
}

/// Per-color pawn placement, bucketed by file.
struct PawnFiles {
    // 0-based ranks per file, ascending
    ranks: [Vec<i32>; 8],
    squares: Vec<Square>,
}

impl PawnFiles {
    fn new(pawns: Bitboard) -> Self {
        let mut ranks: [Vec<i32>; 8] = Default::default();
        let mut squares = Vec::new();
        for sq in pawns {
            ranks[usize::from(sq.file())].push(i32::from(sq.rank()));
            squares.push(sq);
        }
        for file in &mut ranks {
            file.sort_unstable();
        }
        Self { ranks, squares }
    }

    fn on_file(&self, file: i32) -> &[i32] {
        if (0..8).contains(&file) {
            &self.ranks[file as usize]
        } else {
            &[]
        }
    }

    fn has_at(&self, file: i32, rank: i32) -> bool {
        self.on_file(file).contains(&rank)
    }
}

pub fn evaluate(
    white_pawns: Bitboard,
    black_pawns: Bitboard,
    white_king: Option<Square>,
    black_king: Option<Square>,
    endgame: f64,
) -> PawnReport {
    let white = PawnFiles::new(white_pawns);
    let black = PawnFiles::new(black_pawns);

    let mut score = 0;
    let mut passed_white = Vec::new();
    let mut passed_black = Vec::new();

    score += side_structure(&white, &black, Color::White, endgame, &mut passed_white);
    score -= side_structure(&black, &white, Color::Black, endgame, &mut passed_black);

    if endgame > 0.3 {
        score += king_proximity(&passed_white, white_king, black_king, endgame);
        score -= king_proximity(&passed_black, black_king, white_king, endgame);
    }

    if endgame < 0.6 {
        score += pawn_shield(&white, white_king, Color::White, endgame);
        score -= pawn_shield(&black, black_king, Color::Black, endgame);
    }

    PawnReport {
        score,
        passed_white,
        passed_black,
    }
}

/// Structure terms for one side, from that side's point of view.
fn side_structure(
    own: &PawnFiles,
    enemy: &PawnFiles,
    color: Color,
    endgame: f64,
    passed_out: &mut Vec<Square>,
) -> i32 {
    let mut score = 0;

    for file in 0..8i32 {
        let extra = own.on_file(file).len().saturating_sub(1) as i32;
        score -= extra * DOUBLED_PENALTY;
    }

    for &sq in &own.squares {
        let file = i32::from(sq.file());
        let rank = i32::from(sq.rank());
        // Relative rank, 0-based from the side's own back rank.
        let rel = relative_rank(color, rank);

        if is_passed(enemy, color, file, rank) {
            let bonus = PASSED_BONUS[rel as usize] as f64 * (0.5 + 0.5 * endgame);
            score += bonus.round() as i32;
            passed_out.push(sq);
        } else if is_candidate(own, enemy, color, file, rank) {
            score += CANDIDATE_BONUS[rel as usize];
        }

        let isolated = own.on_file(file - 1).is_empty() && own.on_file(file + 1).is_empty();
        if isolated {
            score -= ISOLATED_PENALTY;
        } else if is_backward(own, enemy, color, file, rank) {
            score -= BACKWARD_PENALTY;
        }

        let forward = forward_step(color);
        if own.has_at(file - 1, rank + forward) || own.has_at(file + 1, rank + forward) {
            score += CHAIN_BONUS;
        }

        let connected = [file - 1, file + 1].iter().any(|&f| {
            own.on_file(f)
                .iter()
                .any(|&r| (r - rank).abs() <= 1)
        });
        if connected {
            score += CONNECTED_BONUS;
        }
    }

    score
}

fn forward_step(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

fn relative_rank(color: Color, rank: i32) -> i32 {
    match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    }
}

/// True when the pawn is ahead of `rank` from `color`'s point of view.
fn is_ahead(color: Color, rank: i32, other: i32) -> bool {
    match color {
        Color::White => other > rank,
        Color::Black => other < rank,
    }
}

fn is_passed(enemy: &PawnFiles, color: Color, file: i32, rank: i32) -> bool {
    (file - 1..=file + 1).all(|f| {
        enemy
            .on_file(f)
            .iter()
            .all(|&r| !is_ahead(color, rank, r))
    })
}

/// Own file ahead is empty and adjacent-file supporters outnumber the
/// stoppers ahead on those files.
fn is_candidate(own: &PawnFiles, enemy: &PawnFiles, color: Color, file: i32, rank: i32) -> bool {
    let own_blocked = own
        .on_file(file)
        .iter()
        .any(|&r| is_ahead(color, rank, r));
    let enemy_blocked = enemy
        .on_file(file)
        .iter()
        .any(|&r| is_ahead(color, rank, r));
    if own_blocked || enemy_blocked {
        return false;
    }

    let forward = forward_step(color);
    let near = |r: i32| {
        let d = (r - rank) * forward;
        (-1..=2).contains(&d)
    };
    let supporters: usize = [file - 1, file + 1]
        .iter()
        .map(|&f| own.on_file(f).iter().filter(|&&r| near(r)).count())
        .sum();
    let stoppers: usize = [file - 1, file + 1]
        .iter()
        .map(|&f| {
            enemy
                .on_file(f)
                .iter()
                .filter(|&&r| is_ahead(color, rank, r))
                .count()
        })
        .sum();
    supporters > stoppers
}

/// No friendly supporter behind on adjacent files, the stop square is
/// covered by an enemy pawn and something occupies it.
fn is_backward(own: &PawnFiles, enemy: &PawnFiles, color: Color, file: i32, rank: i32) -> bool {
    let supported = [file - 1, file + 1].iter().any(|&f| {
        own.on_file(f)
            .iter()
            .any(|&r| !is_ahead(color, rank, r))
    });
    if supported {
        return false;
    }

    let forward = forward_step(color);
    let stop = rank + forward;
    let guarded = enemy.has_at(file - 1, stop + forward) || enemy.has_at(file + 1, stop + forward);
    let blocked = own.has_at(file, stop) || enemy.has_at(file, stop);
    guarded && blocked
}

/// Endgame pull of both kings toward a side's passed pawns.
fn king_proximity(
    passed: &[Square],
    own_king: Option<Square>,
    enemy_king: Option<Square>,
    endgame: f64,
) -> i32 {
    let (Some(own), Some(enemy)) = (own_king, enemy_king) else {
        return 0;
    };
    let mut score = 0;
    for &sq in passed {
        let delta = enemy.distance(sq) as f64 - own.distance(sq) as f64;
        score += (delta * 5.0 * endgame).round() as i32;
    }
    score
}

/// Friendly pawns one or two ranks in front of the king on the three files
/// around it.
fn pawn_shield(own: &PawnFiles, king: Option<Square>, color: Color, endgame: f64) -> i32 {
    let Some(king) = king else {
        return 0;
    };
    let kf = i32::from(king.file());
    let kr = i32::from(king.rank());
    let forward = forward_step(color);
    let per_file = (8.0 * (1.0 - endgame)).round() as i32;

    let mut score = 0;
    for file in kf - 1..=kf + 1 {
        if own.has_at(file, kr + forward) || own.has_at(file, kr + 2 * forward) {
            score += per_file;
        }
    }
    score
}

/// Passed pawns of `color` on `file`, for rook placement checks.
pub fn passers_on_file(report: &PawnReport, color: Color, file: i32) -> Vec<Square> {
    let list = match color {
        Color::White => &report.passed_white,
        Color::Black => &report.passed_black,
    };
    list.iter()
        .copied()
        .filter(|sq| i32::from(sq.file()) == file)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn report(fen: &str) -> PawnReport {
        let pos = Position::from_fen(fen).expect("valid FEN");
        let board = pos.board();
        let white = board.by_color(Color::White);
        let black = board.by_color(Color::Black);
        let pawns = board.pawns();
        evaluate(
            pawns & white,
            pawns & black,
            board.king_of(Color::White),
            board.king_of(Color::Black),
            0.0,
        )
    }

    #[test]
    fn lone_pawn_with_open_road_is_passed() {
        let r = report("4k3/8/8/8/3P4/8/8/4K3 w - - 0 1");
        assert_eq!(r.passed_white, vec![Square::D4]);
        assert!(r.passed_black.is_empty());
    }

    #[test]
    fn pawn_behind_enemy_blocker_is_not_passed() {
        let r = report("4k3/8/3p4/8/3P4/8/8/4K3 w - - 0 1");
        assert!(r.passed_white.is_empty());
        assert!(r.passed_black.is_empty());
    }

    #[test]
    fn doubled_and_isolated_pawns_are_penalized() {
        // Two white pawns stacked on the d-file with no neighbors.
        let doubled = report("4k3/8/8/8/3P4/3P4/8/4K3 w - - 0 1");
        let single = report("4k3/8/8/8/8/3P4/8/4K3 w - - 0 1");
        assert!(doubled.score < single.score);
    }

    #[test]
    fn structure_is_color_symmetric() {
        let white_side = report("4k3/8/8/8/2PP4/8/8/4K3 w - - 0 1");
        let black_side = report("4k3/8/8/2pp4/8/8/8/4K3 w - - 0 1");
        assert_eq!(white_side.score, -black_side.score);
    }
}

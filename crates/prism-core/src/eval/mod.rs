//! Static evaluation.
//!
//! Returns an integer centipawn score, positive when white stands better.
//! Terminal verdicts short-circuit everything else: a checkmated side to
//! move scores -30000/+30000 and every drawn state scores 0.

pub mod pawns;
pub mod pst;

use crate::position::Position;
use crate::search::constants::MATE_SCORE;
use pawns::PawnReport;
use pst::{king_square_bonus, piece_value, square_bonus, KING_VALUE};
use shakmaty::{attacks, Bitboard, Board, Color, Role, Square};

const BISHOP_PAIR_BONUS: f64 = 30.0;
const ROOK_OPEN_FILE: i32 = 25;
const ROOK_SEMI_OPEN_FILE: i32 = 12;
const ROOK_ON_SEVENTH: i32 = 25;
const ROOK_BATTERY: i32 = 15;
const KNIGHT_OUTPOST: i32 = 20;
const HANGING_PENALTY: i32 = 20;

/// Full evaluation, including the mobility term.
pub fn evaluate(pos: &Position) -> i32 {
    evaluate_inner(pos, true)
}

/// Evaluation with the mobility term suppressed, for quiescence stand-pat.
pub fn evaluate_static(pos: &Position) -> i32 {
    evaluate_inner(pos, false)
}

fn evaluate_inner(pos: &Position, with_mobility: bool) -> i32 {
    if pos.is_checkmate() {
        return match pos.turn() {
            Color::White => -MATE_SCORE,
            Color::Black => MATE_SCORE,
        };
    }
    if pos.is_stalemate() || pos.is_insufficient_material() || pos.is_threefold() {
        return 0;
    }

    let board = pos.board();
    let white = board.by_color(Color::White);
    let black = board.by_color(Color::Black);
    let white_pawns = board.pawns() & white;
    let black_pawns = board.pawns() & black;
    let white_king = board.king_of(Color::White);
    let black_king = board.king_of(Color::Black);

    let white_material = material(board, Color::White);
    let black_material = material(board, Color::Black);
    let non_king_material = white_material + black_material - 2 * KING_VALUE;
    let endgame = (1.0 - non_king_material as f64 / 3200.0).clamp(0.0, 1.0);

    let mut score = 0;
    score += material_and_squares(board, endgame);
    score += bishop_pair(board, white_pawns.count() + black_pawns.count());

    let pawn_report = pawns::evaluate(white_pawns, black_pawns, white_king, black_king, endgame);
    score += pawn_report.score;

    score += rook_terms(board, &pawn_report, black_king, Color::White, endgame);
    score -= rook_terms(board, &pawn_report, white_king, Color::Black, endgame);
    score += knight_outposts(board, white_pawns, black_pawns);

    if endgame <= 0.7 {
        score += king_attack_zones(board, white_king, black_king, endgame);
    }
    score += king_tropism(board, white_king, black_king);
    score += space(white_pawns, black_pawns, endgame);
    score += hanging_pieces(board, white_pawns, black_pawns);
    score += tempo(pos.turn(), endgame);
    if with_mobility {
        score += mobility(pos, endgame);
    }
    score
}

fn material(board: &Board, color: Color) -> i32 {
    let side = board.by_color(color);
    Role::ALL
        .iter()
        .map(|&role| (board.by_role(role) & side).count() as i32 * piece_value(role))
        .sum()
}

/// Material plus square bonuses, kings blended by phase.
fn material_and_squares(board: &Board, endgame: f64) -> i32 {
    let mut score = 0;
    for sq in board.occupied() {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        let sign = side_sign(piece.color);
        let term = if piece.role == Role::King {
            piece_value(Role::King) + king_square_bonus(piece.color, sq, endgame)
        } else {
            piece_value(piece.role) + square_bonus(piece.role, piece.color, sq)
        };
        score += sign * term;
    }
    score
}

fn side_sign(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// The pair bonus decays as pawns leave the board.
fn bishop_pair(board: &Board, pawn_count: usize) -> i32 {
    let scale = (1.0 - pawn_count as f64 / 16.0).max(0.3);
    let bonus = (BISHOP_PAIR_BONUS * scale).round() as i32;
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let bishops = (board.bishops() & board.by_color(color)).count();
        if bishops >= 2 {
            score += side_sign(color) * bonus;
        }
    }
    score
}

fn rook_terms(
    board: &Board,
    pawn_report: &PawnReport,
    enemy_king: Option<Square>,
    color: Color,
    endgame: f64,
) -> i32 {
    let own_pawns = board.pawns() & board.by_color(color);
    let enemy_pawns = board.pawns() & board.by_color(!color);
    let rooks: Vec<Square> = (board.rooks() & board.by_color(color)).into_iter().collect();

    let (seventh, back_rank) = match color {
        Color::White => (6, 7),
        Color::Black => (1, 0),
    };

    let mut score = 0;
    for &rook in &rooks {
        let file = i32::from(rook.file());
        let rank = i32::from(rook.rank());

        let own_on_file = pawns_on_file(own_pawns, file);
        let enemy_on_file = pawns_on_file(enemy_pawns, file);
        if own_on_file == 0 && enemy_on_file == 0 {
            score += ROOK_OPEN_FILE;
        } else if own_on_file == 0 {
            score += ROOK_SEMI_OPEN_FILE;
        }

        let behind_passer = pawns::passers_on_file(pawn_report, color, file)
            .iter()
            .any(|&p| is_behind(color, rank, i32::from(p.rank())));
        if behind_passer {
            score += (15.0 * endgame).round() as i32;
        }

        if rank == seventh {
            let enemy_pawns_on_seventh = enemy_pawns
                .into_iter()
                .any(|sq| i32::from(sq.rank()) == seventh);
            let king_on_back = enemy_king
                .map(|k| i32::from(k.rank()) == back_rank)
                .unwrap_or(false);
            if enemy_pawns_on_seventh || king_on_back {
                score += ROOK_ON_SEVENTH;
            }
        }
    }

    for (i, &a) in rooks.iter().enumerate() {
        for &b in rooks.iter().skip(i + 1) {
            if a.file() == b.file() || a.rank() == b.rank() {
                score += ROOK_BATTERY;
            }
        }
    }

    score
}

fn pawns_on_file(pawns: Bitboard, file: i32) -> usize {
    pawns
        .into_iter()
        .filter(|sq| i32::from(sq.file()) == file)
        .count()
}

fn is_behind(color: Color, rook_rank: i32, pawn_rank: i32) -> bool {
    match color {
        Color::White => rook_rank < pawn_rank,
        Color::Black => rook_rank > pawn_rank,
    }
}

/// Knights on advanced squares that a friendly pawn protects and no enemy
/// pawn can ever challenge.
fn knight_outposts(board: &Board, white_pawns: Bitboard, black_pawns: Bitboard) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let (own_pawns, enemy_pawns) = match color {
            Color::White => (white_pawns, black_pawns),
            Color::Black => (black_pawns, white_pawns),
        };
        for knight in board.knights() & board.by_color(color) {
            let rank = i32::from(knight.rank());
            let advanced = match color {
                Color::White => rank >= 4,
                Color::Black => rank <= 3,
            };
            if !advanced {
                continue;
            }
            // A pawn protects the knight iff the knight sits on one of the
            // squares that pawn attacks.
            let protected = (attacks::pawn_attacks(!color, knight) & own_pawns).any();
            if !protected {
                continue;
            }
            let file = i32::from(knight.file());
            let challengeable = enemy_pawns.into_iter().any(|sq| {
                let df = (i32::from(sq.file()) - file).abs();
                df == 1
                    && match color {
                        Color::White => i32::from(sq.rank()) > rank,
                        Color::Black => i32::from(sq.rank()) < rank,
                    }
            });
            if !challengeable {
                score += side_sign(color) * KNIGHT_OUTPOST;
            }
        }
    }
    score
}

/// Weighted attacker presence in the 3x3 zone around each king.
fn king_attack_zones(
    board: &Board,
    white_king: Option<Square>,
    black_king: Option<Square>,
    endgame: f64,
) -> i32 {
    let on_black = zone_pressure(board, black_king, Color::White);
    let on_white = zone_pressure(board, white_king, Color::Black);
    let raw = (zone_penalty(on_black) - zone_penalty(on_white)) as f64;
    (raw * (1.0 - endgame)).round() as i32
}

fn zone_pressure(board: &Board, king: Option<Square>, attacker: Color) -> i32 {
    let Some(king) = king else {
        return 0;
    };
    let mut pressure = 0;
    for sq in board.by_color(attacker) {
        if king.distance(sq) > 1 {
            continue;
        }
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        pressure += match piece.role {
            Role::Pawn => 1,
            Role::Knight | Role::Bishop => 2,
            Role::Rook => 3,
            Role::Queen => 5,
            Role::King => 0,
        };
    }
    pressure
}

fn zone_penalty(pressure: i32) -> i32 {
    match pressure {
        0 => 0,
        1 => 10,
        2 => 25,
        3 => 45,
        n => 70 + (n - 3) * 15,
    }
}

/// Minor and major pieces pulled toward the enemy king.
fn king_tropism(board: &Board, white_king: Option<Square>, black_king: Option<Square>) -> i32 {
    let white = tropism_for(board, Color::White, black_king);
    let black = tropism_for(board, Color::Black, white_king);
    ((white - black) as f64 / 2.0).round() as i32
}

fn tropism_for(board: &Board, color: Color, enemy_king: Option<Square>) -> i32 {
    let Some(king) = enemy_king else {
        return 0;
    };
    let mut total = 0;
    for sq in board.by_color(color) {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        let weight = match piece.role {
            Role::Knight => 3,
            Role::Bishop | Role::Rook => 2,
            Role::Queen => 4,
            Role::Pawn | Role::King => continue,
        };
        total += ((7 - king.distance(sq) as i32) * weight).max(0);
    }
    total
}

/// Pawn presence on the four center files, scaled out of the endgame.
fn space(white_pawns: Bitboard, black_pawns: Bitboard, endgame: f64) -> i32 {
    let center = 2..=5;
    let mut white = 0;
    for sq in white_pawns {
        if center.contains(&i32::from(sq.file())) {
            white += i32::from(sq.rank()) - 1;
        }
    }
    let mut black = 0;
    for sq in black_pawns {
        if center.contains(&i32::from(sq.file())) {
            black += 6 - i32::from(sq.rank());
        }
    }
    ((white - black) as f64 * 0.5 * (1.0 - endgame)).round() as i32
}

/// Minor or major pieces attacked by an enemy pawn with no pawn defender.
fn hanging_pieces(board: &Board, white_pawns: Bitboard, black_pawns: Bitboard) -> i32 {
    let mut score = 0;
    for sq in board.occupied() {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        if piece.role == Role::Pawn || piece.role == Role::King {
            continue;
        }
        if piece_value(piece.role) < 300 {
            continue;
        }
        let (own_pawns, enemy_pawns) = match piece.color {
            Color::White => (white_pawns, black_pawns),
            Color::Black => (black_pawns, white_pawns),
        };
        // Enemy pawns attacking this square sit where a pawn of our color
        // would attack from it.
        let attacked = (attacks::pawn_attacks(piece.color, sq) & enemy_pawns).any();
        let defended = (attacks::pawn_attacks(!piece.color, sq) & own_pawns).any();
        if attacked && !defended {
            score -= side_sign(piece.color) * HANGING_PENALTY;
        }
    }
    score
}

fn tempo(turn: Color, endgame: f64) -> i32 {
    let bonus = (15.0 - 10.0 * endgame).round() as i32;
    side_sign(turn) * bonus
}

/// Legal-move-count difference, read for the waiting side by passing the
/// turn; a failed pass contributes a count of 0.
fn mobility(pos: &Position, endgame: f64) -> i32 {
    let to_move = pos.legal_move_count() as i32;
    let waiting = pos.opponent_move_count() as i32;
    let (white, black) = match pos.turn() {
        Color::White => (to_move, waiting),
        Color::Black => (waiting, to_move),
    };
    ((white - black) as f64 * 2.0 * (1.0 - endgame)).round() as i32
}

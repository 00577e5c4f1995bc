//! Material values and piece-square tables.
//!
//! Tables are written from white's perspective with rank 8 in the first
//! row, so a white piece on (file, rank) indexes `(7 - rank) * 8 + file`
//! and black mirrors by vertical flip.

use shakmaty::{Color, Role, Square};

pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;
pub const KING_VALUE: i32 = 20_000;

pub const fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => KING_VALUE,
    }
}

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MID_PST: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_END_PST: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

/// Table index for a piece of `color` on `sq`, black mirrored vertically.
fn table_index(color: Color, sq: Square) -> usize {
    let file = usize::from(sq.file());
    let rank = usize::from(sq.rank());
    match color {
        Color::White => (7 - rank) * 8 + file,
        Color::Black => rank * 8 + file,
    }
}

/// Square bonus for a non-king piece.
pub fn square_bonus(role: Role, color: Color, sq: Square) -> i32 {
    let idx = table_index(color, sq);
    match role {
        Role::Pawn => PAWN_PST[idx],
        Role::Knight => KNIGHT_PST[idx],
        Role::Bishop => BISHOP_PST[idx],
        Role::Rook => ROOK_PST[idx],
        Role::Queen => QUEEN_PST[idx],
        Role::King => 0,
    }
}

/// King square bonus blended between the middlegame and endgame tables.
pub fn king_square_bonus(color: Color, sq: Square, endgame: f64) -> i32 {
    let idx = table_index(color, sq);
    let mid = KING_MID_PST[idx] as f64;
    let end = KING_END_PST[idx] as f64;
    (mid * (1.0 - endgame) + end * endgame).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_mirror_between_colors() {
        let e4 = Square::E4;
        let e5 = Square::E5;
        assert_eq!(
            square_bonus(Role::Pawn, Color::White, e4),
            square_bonus(Role::Pawn, Color::Black, e5)
        );
        let g1 = Square::G1;
        let g8 = Square::G8;
        assert_eq!(
            king_square_bonus(Color::White, g1, 0.0),
            king_square_bonus(Color::Black, g8, 0.0)
        );
    }

    #[test]
    fn king_bonus_blends_with_phase() {
        let d5 = Square::D5;
        let mid = king_square_bonus(Color::White, d5, 0.0);
        let end = king_square_bonus(Color::White, d5, 1.0);
        assert_eq!(mid, -50);
        assert_eq!(end, 40);
        let half = king_square_bonus(Color::White, d5, 0.5);
        assert_eq!(half, -5);
    }
}

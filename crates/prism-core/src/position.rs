//! Position adapter over the `shakmaty` move generation library.
//!
//! Presents the small surface the engine needs: verbose legal moves, LIFO
//! make/unmake, FEN round-trips, terminal predicates and zobrist keys. The
//! search never holds two mutating handles to the same underlying position.

use anyhow::{anyhow, Context, Result};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, FromSetup, Move, Piece, Position as _, Role, Square,
};

/// One legal move in verbose form.
///
/// Carries enough to replay the move on its source position and to form
/// ordering keys; `san` is empty for moves produced on the search's fast
/// path, where algebraic rendering is never consulted.
#[derive(Clone, Debug)]
pub struct EngineMove {
    pub from: Square,
    pub to: Square,
    pub role: Role,
    pub color: Color,
    pub capture: Option<Role>,
    pub promotion: Option<Role>,
    pub san: String,
    inner: Move,
}

impl EngineMove {
    pub fn is_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Neither a capture nor a promotion.
    pub fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    /// From/to key used by killers and the transposition table.
    pub fn key(&self) -> MoveKey {
        (self.from, self.to)
    }

    /// Piece/from/to key used by the history and countermove tables.
    pub fn piece_key(&self) -> PieceKey {
        (self.role, self.from, self.to)
    }
}

/// Key identifying a move by its from and to squares.
pub type MoveKey = (Square, Square);

/// Key identifying a move by moving piece, from and to squares.
pub type PieceKey = (Role, Square, Square);

/// A chess position with an undo stack.
///
/// `make` is reversible by `unmake` in LIFO order; the stack also carries
/// the zobrist keys of every visited state so repetition can be detected
/// without external game history.
pub struct Position {
    pos: Chess,
    undo: Vec<Chess>,
    keys: Vec<u64>,
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parsed: Fen = fen
            .parse()
            .with_context(|| format!("invalid FEN: {fen}"))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|err| anyhow!("illegal position {fen}: {err}"))?;
        Ok(Self::from_chess(pos))
    }

    pub fn startpos() -> Self {
        Self::from_chess(Chess::default())
    }

    fn from_chess(pos: Chess) -> Self {
        let key = hash_of(&pos);
        Self {
            pos,
            undo: Vec::new(),
            keys: vec![key],
        }
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    /// Zobrist key of the current state.
    pub fn zobrist(&self) -> u64 {
        self.keys.last().copied().unwrap_or_default()
    }

    /// All legal moves in verbose form, including SAN.
    pub fn legal_moves(&self) -> Vec<EngineMove> {
        self.pos
            .legal_moves()
            .iter()
            .map(|m| self.verbose(m, true))
            .collect()
    }

    /// All legal moves without SAN rendering, for the search hot path.
    pub fn legal_moves_fast(&self) -> Vec<EngineMove> {
        self.pos
            .legal_moves()
            .iter()
            .map(|m| self.verbose(m, false))
            .collect()
    }

    pub fn legal_move_count(&self) -> usize {
        self.pos.legal_moves().len()
    }

    fn verbose(&self, m: &Move, with_san: bool) -> EngineMove {
        let san = if with_san {
            SanPlus::from_move(self.pos.clone(), m).to_string()
        } else {
            String::new()
        };
        EngineMove {
            from: m.from().unwrap_or_else(|| m.to()),
            to: m.to(),
            role: m.role(),
            color: self.pos.turn(),
            capture: m.capture(),
            promotion: m.promotion(),
            san,
            inner: m.clone(),
        }
    }

    pub fn make(&mut self, m: &EngineMove) {
        self.undo.push(self.pos.clone());
        self.pos.play_unchecked(&m.inner);
        self.keys.push(hash_of(&self.pos));
    }

    pub fn unmake(&mut self) {
        if let Some(prev) = self.undo.pop() {
            self.pos = prev;
            self.keys.pop();
        }
    }

    pub fn in_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.pos.is_insufficient_material()
    }

    /// The current state occurred at least three times on the make stack.
    pub fn is_threefold(&self) -> bool {
        let current = self.zobrist();
        self.keys.iter().filter(|&&k| k == current).count() >= 3
    }

    pub fn is_terminal(&self) -> bool {
        self.pos.is_game_over() || self.is_threefold()
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.pos.board().piece_at(sq)
    }

    pub fn board(&self) -> &shakmaty::Board {
        self.pos.board()
    }

    /// Position with the turn passed to the opponent.
    ///
    /// The en-passant square is cleared and the halfmove clock bumped.
    /// Returns `None` when the result is not a well-formed position, which
    /// happens when the side no longer to move stands in check.
    pub fn passed_turn(&self) -> Option<Position> {
        let mut setup = self.pos.clone().into_setup(EnPassantMode::Always);
        setup.turn = !setup.turn;
        setup.ep_square = None;
        setup.halfmoves = setup.halfmoves.saturating_add(1);
        let pos: Chess = Chess::from_setup(setup, CastlingMode::Standard).ok()?;
        Some(Position::from_chess(pos))
    }

    /// Legal move count of the side not to move, or 0 when passing the turn
    /// does not produce a usable position.
    pub fn opponent_move_count(&self) -> usize {
        self.passed_turn()
            .map(|p| p.legal_move_count())
            .unwrap_or(0)
    }
}

fn hash_of(pos: &Chess) -> u64 {
    pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

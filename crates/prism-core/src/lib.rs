//! prism-core: a concurrent multi-line chess analysis engine.
//!
//! Two subsystems carry the weight. The search core runs an alpha-beta
//! minimax with quiescence, a transposition table, null-move pruning,
//! late-move reductions, killers, history and countermoves, razoring,
//! futility, aspiration windows and iterative deepening. On top of it,
//! a coordinator fans a position out into hundreds of derivative subtree
//! tasks over a fixed pool of isolated workers and folds the results into
//! an incrementally updated, color-keyed ranking of candidate lines.
//!
//! Move generation, FEN handling and SAN rendering come from `shakmaty`,
//! wrapped by [`Position`].

pub mod analysis;
pub mod eval;
pub mod position;
pub mod search;

pub use analysis::coordinator::{Coordinator, CoordinatorConfig, Line, Stats};
pub use analysis::palette::{color_for, format_score, PALETTE};
pub use analysis::plan;
pub use analysis::pool::{TaskReceipt, WorkerPool};
pub use analysis::task::{Task, TaskOutcome};
pub use position::{EngineMove, Position, STARTPOS_FEN};
pub use search::driver::{search_root, ScoredMove};
pub use search::SearchContext;

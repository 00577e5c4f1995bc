//! Line colors and score rendering.

use crate::search::constants::{MATE_BOUND, MATE_SCORE};

/// Colors assigned to lines in emission order; the 33rd line wraps.
pub const PALETTE: [&str; 32] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac", "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
    "#e377c2", "#7f7f7f", "#bcbd22", "#17becf", "#aec7e8", "#ffbb78", "#98df8a", "#ff9896",
    "#c5b0d5", "#c49c94", "#f7b6d2", "#c7c7c7", "#dbdb8d", "#9edae5", "#393b79", "#637939",
];

pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Renders a centipawn score for display: `M<k>` for mates, signed
/// pawn-unit decimal otherwise.
pub fn format_score(score: i32) -> String {
    if score.abs() >= MATE_BOUND {
        let plies = MATE_SCORE - score.abs();
        let k = (plies + 1) / 2;
        if score >= 0 {
            format!("M{k}")
        } else {
            format!("-M{k}")
        }
    } else if score >= 0 {
        format!("+{:.2}", score as f64 / 100.0)
    } else {
        format!("{:.2}", score as f64 / 100.0)
    }
}

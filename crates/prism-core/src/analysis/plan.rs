//! Plan generation.
//!
//! Expands one analysis request into a bounded list of tasks: a root task
//! covering every root move, one level-1 task per root move, and a budget
//! of level-2 tasks over the earliest replies. Emission order is
//! significant downstream and is preserved on dispatch.

use crate::analysis::task::Task;
use crate::position::Position;
use anyhow::Result;

const LEVEL1_MULTI_PV: usize = 4;

/// `multi_pv` bounds how many ranked lines the root plan asks for; it is
/// still capped by the number of legal root moves.
pub fn generate(fen: &str, max_plans: usize, max_depth: u32, multi_pv: usize) -> Result<Vec<Task>> {
    let mut pos = Position::from_fen(fen)?;
    let root_moves = pos.legal_moves();

    let mut plans = Vec::with_capacity(max_plans);
    plans.push(Task {
        id: Task::ROOT_ID.to_string(),
        fen: fen.to_string(),
        depth: max_depth,
        multi_pv: root_moves.len().min(multi_pv),
        root_move: None,
        moves: Vec::new(),
    });

    let root_count = root_moves.len().max(1);
    let mut level1 = 0usize;
    let mut level2 = 0usize;
    let mut full = plans.len() >= max_plans;

    for rm in &root_moves {
        if full {
            break;
        }
        pos.make(rm);
        let replies = pos.legal_moves();

        plans.push(Task {
            id: format!("l1-{level1}"),
            fen: pos.fen(),
            depth: max_depth.saturating_sub(1).max(1),
            multi_pv: replies.len().min(LEVEL1_MULTI_PV),
            root_move: Some(rm.san.clone()),
            moves: vec![rm.san.clone()],
        });
        level1 += 1;
        full = plans.len() >= max_plans;

        if !full {
            // Remaining budget spread evenly over the root moves.
            let quota = (max_plans - plans.len()).div_ceil(root_count);
            for rp in replies.iter().take(quota) {
                pos.make(rp);
                plans.push(Task {
                    id: format!("l2-{level2}"),
                    fen: pos.fen(),
                    depth: max_depth.saturating_sub(2).max(1),
                    multi_pv: 1,
                    root_move: Some(rm.san.clone()),
                    moves: vec![rm.san.clone(), rp.san.clone()],
                });
                level2 += 1;
                pos.unmake();
                if plans.len() >= max_plans {
                    full = true;
                    break;
                }
            }
        }

        pos.unmake();
    }

    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::STARTPOS_FEN;

    #[test]
    fn startpos_fills_the_budget_exactly() {
        let plans = generate(STARTPOS_FEN, 32, 6, 8).expect("plan generation succeeds");
        assert_eq!(plans.len(), 32);
        assert_eq!(plans[0].id, "root");
        assert_eq!(plans[0].multi_pv, 8);
        assert_eq!(plans[0].depth, 6);
    }

    #[test]
    fn multi_pv_bounds_the_root_plan() {
        let narrow = generate(STARTPOS_FEN, 8, 3, 3).expect("plan generation succeeds");
        assert_eq!(narrow[0].multi_pv, 3);

        // More lines than legal moves clamps to the move count.
        let wide = generate(STARTPOS_FEN, 8, 3, 32).expect("plan generation succeeds");
        assert_eq!(wide[0].multi_pv, 20);
    }

    #[test]
    fn depths_decrease_per_level_and_floor_at_one() {
        let plans = generate(STARTPOS_FEN, 8, 2, 8).expect("plan generation succeeds");
        for task in &plans {
            match task.moves.len() {
                0 => assert_eq!(task.depth, 2),
                1 => assert_eq!(task.depth, 1),
                2 => assert_eq!(task.depth, 1),
                n => panic!("unexpected prefix length {n}"),
            }
        }
    }

    #[test]
    fn small_position_emits_root_then_interleaved_levels() {
        // Lone kings: white has three legal moves from a1.
        let plans = generate("7k/8/8/8/8/8/8/K7 w - - 0 1", 4, 3, 8)
            .expect("plan generation succeeds");
        let ids: Vec<&str> = plans.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["root", "l1-0", "l2-0", "l1-1"]);
        assert_eq!(plans[1].moves.len(), 1);
        assert!(["Ka2", "Kb1", "Kb2"].contains(&plans[1].moves[0].as_str()));
        assert_eq!(plans[2].moves.len(), 2);
    }

    #[test]
    fn task_ids_are_unique_and_fen_matches_prefix() {
        let plans = generate(STARTPOS_FEN, 16, 4, 8).expect("plan generation succeeds");
        let mut seen = std::collections::HashSet::new();
        for task in &plans {
            assert!(seen.insert(task.id.clone()), "duplicate id {}", task.id);
        }
        // A level-1 task's position is one ply past the root.
        let level1 = plans.iter().find(|t| t.id == "l1-0").expect("level-1 task");
        assert_ne!(level1.fen, STARTPOS_FEN);
        assert_eq!(level1.root_move.as_deref(), Some(level1.moves[0].as_str()));
    }

    #[test]
    fn terminal_root_emits_only_the_root_task() {
        let plans = generate("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 32, 4, 8)
            .expect("plan generation succeeds");
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].multi_pv, 0);
    }
}

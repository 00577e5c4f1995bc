//! Command-line front end for the prism analysis engine.
//!
//! Runs one analysis of a position and renders the ranked candidate
//! lines, either as a table or as JSON.

use anyhow::Result;
use clap::Parser;
use prism_core::{format_score, Coordinator, CoordinatorConfig, Line, Stats, STARTPOS_FEN};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Position to analyse, as a FEN string
    #[arg(long, default_value = STARTPOS_FEN)]
    fen: String,

    /// Search depth of the root plan
    #[arg(long, default_value_t = 4)]
    depth: u32,

    /// Number of analysis workers; defaults to the core count, capped at 4
    #[arg(long)]
    workers: Option<usize>,

    /// Upper bound on generated analysis plans
    #[arg(long, default_value_t = 64)]
    max_plans: usize,

    /// Number of ranked lines requested from the root plan
    #[arg(long, default_value_t = 8)]
    multipv: usize,

    /// Emit the final ranking as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(
            env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "debug"),
        );
    } else {
        env_logger::init_from_env(
            env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
        );
    }

    let workers = args
        .workers
        .unwrap_or_else(|| num_cpus::get().min(4))
        .max(1);
    let config = CoordinatorConfig {
        worker_count: workers,
        max_plans: args.max_plans,
        max_depth: args.depth,
        multi_pv: args.multipv,
    };

    let coordinator = Coordinator::new(config, |lines, stats| {
        log::info!(
            "{}/{} plans, {} lines, {} nodes, {} nps",
            stats.tasks,
            stats.total,
            lines.len(),
            stats.nodes,
            stats.nps
        );
    });

    let (lines, stats) = coordinator.start(&args.fen)?;
    coordinator.stop();

    if args.json {
        let report = serde_json::json!({ "lines": lines, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_table(&lines, &stats);
    }

    Ok(())
}

fn render_table(lines: &[Line], stats: &Stats) {
    if lines.is_empty() {
        println!("no legal moves in this position");
        return;
    }

    println!(
        "{:<4} {:<10} {:>8} {:>6} {:>6}  {}",
        "#", "move", "score", "depth", "plans", "line"
    );
    for (rank, line) in lines.iter().enumerate() {
        println!(
            "{:<4} {:<10} {:>8} {:>6} {:>6}  {}",
            rank + 1,
            line.root_move,
            format_score(line.score),
            line.depth,
            line.plans,
            line.moves.join(" ")
        );
    }
    println!(
        "{} nodes in {:.2}s ({} nps), {}/{} plans settled",
        stats.nodes, stats.elapsed, stats.nps, stats.tasks, stats.total
    );
}

//! Laws the static evaluation must satisfy.

use prism_core::eval::{evaluate, evaluate_static};
use prism_core::Position;

/// Swaps piece colors, flips the board vertically and passes the move,
/// producing the color-mirrored position.
fn mirror_fen(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    assert_eq!(fields.len(), 6, "unexpected FEN shape: {fen}");

    let board: Vec<String> = fields[0]
        .split('/')
        .rev()
        .map(|rank| {
            rank.chars()
                .map(|c| {
                    if c.is_ascii_alphabetic() {
                        if c.is_ascii_uppercase() {
                            c.to_ascii_lowercase()
                        } else {
                            c.to_ascii_uppercase()
                        }
                    } else {
                        c
                    }
                })
                .collect()
        })
        .collect();

    let turn = if fields[1] == "w" { "b" } else { "w" };

    let castling = if fields[2] == "-" {
        "-".to_string()
    } else {
        let mut rights: Vec<char> = fields[2]
            .chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect();
        rights.sort_by_key(|c| match c {
            'K' => 0,
            'Q' => 1,
            'k' => 2,
            'q' => 3,
            _ => 4,
        });
        rights.into_iter().collect()
    };

    let ep = if fields[3] == "-" {
        "-".to_string()
    } else {
        let mut chars = fields[3].chars();
        let file = chars.next().expect("ep file");
        let rank = match chars.next().expect("ep rank") {
            '3' => '6',
            '6' => '3',
            other => other,
        };
        format!("{file}{rank}")
    };

    format!(
        "{} {} {} {} {} {}",
        board.join("/"),
        turn,
        castling,
        ep,
        fields[4],
        fields[5]
    )
}

fn eval_of(fen: &str) -> i32 {
    let pos = Position::from_fen(fen).expect("valid FEN");
    evaluate(&pos)
}

#[test]
fn evaluation_is_color_antisymmetric() {
    let positions = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkb1r/ppp2ppp/4pn2/3p4/2PP4/5N2/PP2PPPP/RNBQKB1R w KQkq - 0 4",
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2k5/3p4/p2P1p2/P2P1P2/8/8/4K3 w - - 0 1",
        "6k1/5ppp/8/8/2R5/8/5PPP/6K1 w - - 0 1",
    ];
    for fen in positions {
        let mirrored = mirror_fen(fen);
        assert_eq!(
            eval_of(fen),
            -eval_of(&mirrored),
            "mirror law broken for {fen} vs {mirrored}"
        );
    }
}

#[test]
fn startpos_stays_within_the_tempo_band() {
    let score = eval_of("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    assert!((-20..=20).contains(&score), "startpos scored {score}");
}

#[test]
fn terminal_verdicts_are_fixed() {
    // White to move, checkmated.
    assert_eq!(
        eval_of("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"),
        -30_000
    );
    // Black to move, checkmated.
    assert_eq!(
        eval_of("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4"),
        30_000
    );
    // Stalemate and insufficient material are dead draws.
    assert_eq!(eval_of("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"), 0);
    assert_eq!(eval_of("8/8/8/4k3/8/4K3/8/8 w - - 0 1"), 0);
}

#[test]
fn threefold_repetition_scores_zero() {
    let mut pos = Position::startpos();
    for _ in 0..2 {
        for san in ["Nf3", "Nf6", "Ng1", "Ng8"] {
            let m = pos
                .legal_moves()
                .into_iter()
                .find(|m| m.san == san)
                .expect("shuttle move is legal");
            pos.make(&m);
        }
    }
    assert_eq!(evaluate(&pos), 0);
}

#[test]
fn static_variant_only_differs_by_mobility() {
    // A symmetric position has zero mobility difference, so both
    // variants agree.
    let pos = Position::startpos();
    assert_eq!(evaluate(&pos), evaluate_static(&pos));
}

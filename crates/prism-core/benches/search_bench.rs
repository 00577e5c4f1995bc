use criterion::{criterion_group, criterion_main, Criterion};
use prism_core::{search_root, Position, SearchContext, STARTPOS_FEN};

const MIDDLEGAME_FEN: &str = "r1bq1rk1/pp2bppp/2n1pn2/3p4/2PP4/2N1PN2/PP2BPPP/R1BQ1RK1 w - - 0 8";

fn bench_root_search(c: &mut Criterion) {
    c.bench_function("startpos depth 3", |b| {
        b.iter(|| {
            let mut ctx = SearchContext::new();
            let mut pos = Position::from_fen(STARTPOS_FEN).expect("valid FEN");
            search_root(&mut ctx, &mut pos, 3, 3)
        })
    });

    c.bench_function("middlegame depth 3", |b| {
        b.iter(|| {
            let mut ctx = SearchContext::new();
            let mut pos = Position::from_fen(MIDDLEGAME_FEN).expect("valid FEN");
            search_root(&mut ctx, &mut pos, 3, 3)
        })
    });

    c.bench_function("middlegame depth 3, warm tables", |b| {
        let mut ctx = SearchContext::new();
        let mut pos = Position::from_fen(MIDDLEGAME_FEN).expect("valid FEN");
        b.iter(|| search_root(&mut ctx, &mut pos, 3, 3))
    });
}

criterion_group!(benches, bench_root_search);
criterion_main!(benches);

//! Search throughput on the connection game.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_boardgame::core::GameRng;
use rust_boardgame::games::connect::{ConnectBoard, ConnectEvaluator};
use rust_boardgame::mcts::{KillMode, MctsConfig, MctsSearch};
use rust_boardgame::rules::{Board, ExecuteMode};
use rust_boardgame::search::{AlphaBeta, AlphaBetaConfig, Budget, CancelToken, DepthPolicy};

// =============================================================================
// MCTS
// =============================================================================

fn bench_mcts_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_iterations");
    group.sample_size(20);

    for iterations in [500u64, 2_000, 8_000] {
        group.throughput(Throughput::Elements(iterations));
        group.bench_with_input(BenchmarkId::new("connect_7", iterations), &iterations, |b, &n| {
            let config = MctsConfig::default()
                .with_early_exit(false)
                .with_kill(KillMode::Off, 0.5);
            let search = MctsSearch::new(config);
            b.iter(|| {
                let limits = Budget::nodes(n).start(&CancelToken::new());
                black_box(search.search(ConnectBoard::new(7), &limits))
            });
        });
    }
    group.finish();
}

fn bench_mcts_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_threads");
    group.sample_size(10);
    group.throughput(Throughput::Elements(8_000));

    for threads in [1usize, 2, 4] {
        group.bench_with_input(BenchmarkId::new("connect_7", threads), &threads, |b, &threads| {
            let config = MctsConfig::default()
                .with_threads(threads)
                .with_early_exit(false)
                .with_kill(KillMode::Off, 0.5);
            let search = MctsSearch::new(config);
            b.iter(|| {
                let limits = Budget::nodes(8_000).start(&CancelToken::new());
                black_box(search.search_with_rng(ConnectBoard::new(7), &limits, &GameRng::new(42)))
            });
        });
    }
    group.finish();
}

// =============================================================================
// Alpha-beta
// =============================================================================

fn bench_alpha_beta_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("alpha_beta_depth");
    group.sample_size(10);

    // A few stones down so the evaluator has something to chew on.
    let mut board = ConnectBoard::new(6);
    for (col, row) in [(2, 2), (3, 3), (2, 3), (3, 2)] {
        let mv = board.place(col, row);
        board.execute(&mv, ExecuteMode::Live);
    }

    for depth in [1u32, 2, 3] {
        group.bench_with_input(BenchmarkId::new("connect_6", depth), &depth, |b, &depth| {
            let config = AlphaBetaConfig::default().with_depth(DepthPolicy::Plies(depth));
            b.iter(|| {
                let limits = Budget::unlimited().start(&CancelToken::new());
                let mut search = AlphaBeta::new(&config, &ConnectEvaluator, limits, GameRng::new(1));
                black_box(search.search(board.clone()))
            });
        });
    }
    group.finish();
}

// =============================================================================
// Board primitives
// =============================================================================

fn bench_execute_unexecute(c: &mut Criterion) {
    let board = ConnectBoard::new(9);
    let moves = board.legal_moves();

    c.bench_function("connect_9_execute_unexecute", |b| {
        let mut board = board.clone();
        b.iter(|| {
            for mv in &moves {
                board.execute(mv, ExecuteMode::Search);
                black_box(board.fingerprint());
                board.unexecute(mv);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_mcts_iterations,
    bench_mcts_threads,
    bench_alpha_beta_depth,
    bench_execute_unexecute,
);
criterion_main!(benches);

//! Performance benchmarks for critical session paths

use server::registry::{RegistryConfig, SessionRegistry, WordSource};
use server::wordlist::WordLists;
use shared::{generate_board, Team, BOARD_SIZE};
use std::time::Instant;

fn universe(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("word{}", i)).collect()
}

/// Benchmarks board generation from a large word list
#[test]
fn benchmark_board_generation() {
    let words = universe(5_000);
    let iterations = 10_000;
    let start = Instant::now();

    for seed in 0..iterations {
        let board = generate_board(seed, &words).unwrap();
        assert_eq!(board.words.len(), BOARD_SIZE);
    }

    let duration = start.elapsed();
    println!(
        "Board generation: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 5 seconds even in debug builds
    assert!(duration.as_secs() < 5);
}

/// Benchmarks generation when the universe is barely large enough
#[test]
fn benchmark_tight_universe() {
    let words = universe(BOARD_SIZE);
    let iterations = 2_000;
    let start = Instant::now();

    for seed in 0..iterations {
        generate_board(seed, &words).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Tight universe: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks registry throughput for polling players
#[test]
fn benchmark_registry_polling() {
    let mut lists = WordLists::new();
    lists.insert("green", universe(500));
    let registry = SessionRegistry::new(RegistryConfig::default(), lists);

    let games = 100;
    let polls_per_game = 100;
    let start = Instant::now();

    tokio_test::block_on(async {
        for g in 0..games {
            registry
                .create_or_get(&format!("g{}", g), WordSource::Default, None)
                .await
                .unwrap();
        }
        for p in 0..polls_per_game {
            for g in 0..games {
                let team = if p % 2 == 0 { Team::One } else { Team::Two };
                registry
                    .record_presence(&format!("g{}", g), &format!("p{}", p % 8), Some(team))
                    .await
                    .unwrap();
            }
        }
    });

    let duration = start.elapsed();
    let operations = games * polls_per_game;
    println!(
        "Registry polling: {} operations in {:?} ({:.2} μs/op)",
        operations,
        duration,
        duration.as_micros() as f64 / operations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks a sweep over many idle games
#[test]
fn benchmark_sweep() {
    let mut lists = WordLists::new();
    lists.insert("green", universe(500));
    let registry = SessionRegistry::new(RegistryConfig::default(), lists);

    let games = 2_000;
    tokio_test::block_on(async {
        for g in 0..games {
            registry
                .create_or_get(&format!("g{}", g), WordSource::Default, None)
                .await
                .unwrap();
            registry
                .record_presence(&format!("g{}", g), "p1", None)
                .await
                .unwrap();
        }
    });

    let start = Instant::now();
    let report = tokio_test::block_on(registry.sweep_now());
    let duration = start.elapsed();

    println!("Sweep over {} games took {:?}", games, duration);
    assert_eq!(report.sessions_kept, games);
    assert!(duration.as_millis() < 1000);
}

use std::path::Path;
use std::sync::atomic::AtomicBool;

use bigbuddha::seeds::SeedSource;
use bigbuddha::{iterate, scheduler, Classification, Config, Engine, RandomSource};

fn config(dir: &Path, threads: usize, cycles: usize) -> Config {
    Config {
        precision: 64,
        max_iterations: 50,
        cycle_size: 10,
        n_cycles: cycles,
        max_concurrency: threads,
        width: 200,
        height: 100,
        grid_lanes: 101,
        image_path: dir.join("buddhabrot.png"),
        max_path: dir.join("max.txt"),
        ..Config::default()
    }
}

#[test]
fn density_total_matches_the_surviving_orbits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1, 30);
    let engine = Engine::with_source(config.clone(), Box::new(RandomSource::seeded(2024))).unwrap();
    scheduler::run_cycles(&engine, config.n_cycles).unwrap();

    // Replay the same seed stream by hand.
    let replay = RandomSource::seeded(2024);
    let mut expected = 0_u64;
    for _ in 0..config.n_cycles {
        for seed in replay.draw(config.cycle_size, config.precision).unwrap() {
            if engine.grid().classify(&seed) != Classification::NearBorder {
                continue;
            }
            let orbit = iterate(&seed, config.max_iterations);
            expected += engine.orbit_pixels(&orbit).len() as u64;
        }
    }

    assert!(expected > 0);
    assert_eq!(engine.snapshot().total(), expected);
    assert_eq!(engine.progress().points_found.value(), expected);
}

#[test]
fn same_seed_stream_gives_the_same_picture() {
    let dir = tempfile::tempdir().unwrap();
    let first = Engine::with_source(config(dir.path(), 1, 25), Box::new(RandomSource::seeded(77))).unwrap();
    let second = Engine::with_source(config(dir.path(), 1, 25), Box::new(RandomSource::seeded(77))).unwrap();
    scheduler::run_cycles(&first, 25).unwrap();
    scheduler::run_cycles(&second, 25).unwrap();
    assert_eq!(first.snapshot(), second.snapshot());
}

#[test]
fn worker_count_does_not_change_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let single = Engine::with_source(config(dir.path(), 1, 40), Box::new(RandomSource::seeded(5))).unwrap();
    let eight = Engine::with_source(config(dir.path(), 8, 40), Box::new(RandomSource::seeded(5))).unwrap();
    scheduler::run_cycles(&single, 40).unwrap();
    scheduler::run_cycles(&eight, 40).unwrap();

    assert_eq!(single.progress().cycles_run.value(), 40);
    assert_eq!(eight.progress().cycles_run.value(), 40);
    assert_eq!(single.snapshot().total(), eight.snapshot().total());
    assert_eq!(single.snapshot(), eight.snapshot());
}

#[test]
fn warm_start_resumes_from_the_last_render() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 2, 30);
    let first = Engine::with_source(config.clone(), Box::new(RandomSource::seeded(8))).unwrap();
    let stats = scheduler::run(&first, &AtomicBool::new(false)).unwrap();
    assert_eq!(stats.cycles, 30);
    let before = first.snapshot();

    let resumed_config = Config {
        warm_start: true,
        ..config
    };
    let resumed = Engine::with_source(resumed_config, Box::new(RandomSource::seeded(9))).unwrap();
    let after = resumed.snapshot();

    assert_eq!(after.max(), before.max());
    assert_eq!(resumed.progress().prior_points(), after.total());
    assert_eq!(resumed.progress().stats().max, u64::from(before.max()));
    if before.max() <= 255 {
        for (a, b) in before.counts().iter().zip(after.counts()) {
            assert!((i32::from(*a) - i32::from(*b)).abs() <= 1);
        }
    }
}

#[test]
fn warm_start_without_a_checkpoint_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        warm_start: true,
        ..config(dir.path(), 1, 1)
    };
    let engine = Engine::with_source(config, Box::new(RandomSource::seeded(1))).unwrap();
    assert_eq!(engine.snapshot().total(), 0);
    assert_eq!(engine.progress().prior_points(), 0);
}

//! Purrito Benchmark Suite
//!
//! Targets for a single chat pet:
//!   action_resolve_memory ............. < 20μs
//!   action_resolve_sqlite ............. < 200μs
//!   decay_pass_200_bonded_memory ...... < 500μs
//!   leaderboard_top5_from_500 ......... < 300μs

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use purrito_core::persistence::SqliteStore;
use purrito_core::{
    DayZone, ManualClock, MemoryStore, Pet, RandDice, RecordStore, Scope, TimeSource,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 15, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn scope() -> Scope {
    Scope::new("bench", "#cats")
}

fn make_pet(store: Arc<dyn RecordStore>, clock: Arc<ManualClock>) -> Pet {
    let utc = DayZone::Named(chrono_tz::UTC);
    Pet::builder(scope(), store)
        .time(TimeSource::new(clock, utc, utc))
        .dice(Box::new(RandDice::seeded(7)))
        .build()
        .expect("pet builds")
}

fn seed_players(store: &dyn RecordStore, count: u32, affection: impl Fn(u32) -> u8) {
    for i in 0..count {
        let key = scope().key(&format!("player{i}"));
        store.upsert_affection(&key, affection(i)).expect("seed");
        store
            .touch_interaction(&key, t0() - TimeDelta::days(2))
            .expect("seed");
    }
}

const ACTIONS: [&str; 5] = ["!pet", "!feed", "!laser", "!love", "!catnip"];

/// Benchmark: one gated action against the in-memory store.
fn bench_resolve_memory(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(t0()));
    let pet = make_pet(Arc::new(MemoryStore::new()), clock.clone());
    let mut i = 0_usize;

    c.bench_function("action_resolve_memory", |b| {
        b.iter(|| {
            pet.force_absent();
            pet.ensure_present(TimeDelta::minutes(3));
            let action = ACTIONS[i % ACTIONS.len()];
            let player = format!("p{}", i % 64);
            i += 1;
            clock.advance(TimeDelta::seconds(1));
            black_box(pet.resolve(black_box(action), &player, "purrito"));
        });
    });
}

/// Benchmark: one gated action against in-memory SQLite.
fn bench_resolve_sqlite(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = SqliteStore::open_in_memory().expect("sqlite");
    let pet = make_pet(Arc::new(store), clock.clone());
    let mut i = 0_usize;

    c.bench_function("action_resolve_sqlite", |b| {
        b.iter(|| {
            pet.force_absent();
            pet.ensure_present(TimeDelta::minutes(3));
            let action = ACTIONS[i % ACTIONS.len()];
            let player = format!("p{}", i % 64);
            i += 1;
            clock.advance(TimeDelta::seconds(1));
            black_box(pet.resolve(black_box(action), &player, "purrito"));
        });
    });
}

/// Benchmark: decay pass over 200 bonded, silent players.
fn bench_decay_pass(c: &mut Criterion) {
    c.bench_function("decay_pass_200_bonded_memory", |b| {
        b.iter_batched(
            || {
                let store = Arc::new(MemoryStore::new());
                seed_players(store.as_ref(), 200, |_| 100);
                let clock = Arc::new(ManualClock::new(t0()));
                make_pet(store, clock)
            },
            |pet| black_box(pet.run_daily_decay().expect("decay")),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: leaderboard over 500 players.
fn bench_leaderboard(c: &mut Criterion) {
    let store = Arc::new(MemoryStore::new());
    seed_players(store.as_ref(), 500, |i| u8::try_from(i % 101).unwrap_or(100));
    let pet = make_pet(store, Arc::new(ManualClock::new(t0())));

    c.bench_function("leaderboard_top5_from_500", |b| {
        b.iter(|| black_box(pet.leaderboard(black_box(Some(5))).expect("leaderboard")));
    });
}

criterion_group!(
    benches,
    bench_resolve_memory,
    bench_resolve_sqlite,
    bench_decay_pass,
    bench_leaderboard,
);
criterion_main!(benches);

//! Criterion benchmarks for barsim hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full backtest iteration) per strategy and series length
//! 2. Commission models (per-fill fee evaluation)
//! 3. Risk overlay exit check on an open position

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use barsim_core::components::commission::{CommissionModel, FixedRate, NoCommission, Tiered};
use barsim_core::components::registry::StrategyRegistry;
use barsim_core::components::risk::{RiskOverlay, RiskParams};
use barsim_core::components::strategy::NullStrategy;
use barsim_core::domain::{Bar, Position, Side};
use barsim_core::engine::{run_backtest, EngineConfig};
use barsim_core::fingerprint::ComponentConfig;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar::new(
                start + chrono::Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0,
            )
        })
        .collect()
}

fn overlay_for(id: &str) -> RiskOverlay {
    let strategy = StrategyRegistry::with_builtins()
        .create(&ComponentConfig::new(id))
        .unwrap();
    RiskOverlay::builder()
        .strategy(strategy)
        .params(RiskParams::default())
        .build()
        .unwrap()
}

// ── 1. Bar Loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");
    let config = EngineConfig::new(100_000.0);

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        for id in ["null", "ma_crossover", "bollinger"] {
            let overlay = overlay_for(id);
            group.bench_with_input(BenchmarkId::new(id, bar_count), &bar_count, |b, _| {
                b.iter(|| {
                    run_backtest(
                        black_box(&bars),
                        &overlay,
                        Box::new(Tiered::ibkr_pro()),
                        black_box(&config),
                    )
                });
            });
        }
    }

    group.finish();
}

// ── 2. Commission Models ─────────────────────────────────────────────

fn bench_commission(c: &mut Criterion) {
    let mut group = c.benchmark_group("commission");
    let models: Vec<(&str, Box<dyn CommissionModel>)> = vec![
        ("none", Box::new(NoCommission)),
        ("fixed_rate", Box::new(FixedRate { rate: 0.001 })),
        ("tiered", Box::new(Tiered::ibkr_pro())),
    ];
    for (name, model) in &models {
        group.bench_function(*name, |b| {
            b.iter(|| model.fee(black_box(-250.0), black_box(101.25)))
        });
    }
    group.finish();
}

// ── 3. Risk Overlay ──────────────────────────────────────────────────

fn bench_overlay(c: &mut Criterion) {
    let bars = make_bars(2520);
    let overlay = RiskOverlay::builder()
        .strategy(Box::new(NullStrategy))
        .build()
        .unwrap();
    let mut position = Position::new(Side::Long, 100.0, 50.0, 0.0, bars[0].timestamp, 0);
    position.stop_price = Some(40.0);

    c.bench_function("overlay_on_bar_open_position", |b| {
        b.iter(|| {
            for t in 1..bars.len() {
                let _ = black_box(overlay.on_bar(&bars[..=t], Some(&position)));
            }
        });
    });
}

criterion_group!(benches, bench_bar_loop, bench_commission, bench_overlay);
criterion_main!(benches);

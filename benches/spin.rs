//! Spin resolution benchmarks
//!
//! Run with: cargo bench --bench spin

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use climate_board::game::gate::is_within_range;
use climate_board::game::board::SQUARES;
use climate_board::game::spinner::{resolve_angle, Spinner};
use climate_board::game::animation::SpinTimeline;
use climate_board::location::LocationSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_angle");

    for count in [12usize, 1_000, 100_000] {
        let mut rng = StdRng::seed_from_u64(7);
        let angles: Vec<f64> = (0..count).map(|_| rng.gen_range(0.0..3600.0)).collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &angles, |b, angles| {
            b.iter(|| {
                for &angle in angles {
                    black_box(resolve_angle(black_box(angle)));
                }
            })
        });
    }

    group.finish();
}

fn bench_spin_cycle(c: &mut Criterion) {
    c.bench_function("spinner_begin_complete", |b| {
        let mut spinner = Spinner::new(5);
        let mut rng = StdRng::seed_from_u64(11);
        b.iter(|| {
            let ticket = spinner.begin(&mut rng);
            black_box(spinner.complete(ticket.generation))
        })
    });
}

fn bench_timeline(c: &mut Criterion) {
    let mut spinner = Spinner::new(5);
    let ticket = spinner.begin_with(123.0);
    let timeline = SpinTimeline::new(&ticket, Duration::from_millis(4000));

    // One frame every 16ms over the whole animation
    c.bench_function("timeline_250_frames", |b| {
        b.iter(|| {
            for frame in 0..250u64 {
                black_box(timeline.angle_at(Duration::from_millis(frame * 16)));
            }
        })
    });
}

fn bench_gate(c: &mut Criterion) {
    let sample = LocationSample::new(50.7352, -3.5332);
    c.bench_function("gate_all_squares", |b| {
        b.iter(|| {
            for square in SQUARES.iter() {
                black_box(is_within_range(square, Some(black_box(&sample)), 0.1));
            }
        })
    });
}

criterion_group!(benches, bench_resolve, bench_spin_cycle, bench_timeline, bench_gate);
criterion_main!(benches);

use ccrank_core::{DeterministicRng, Platform, PlatformConfig};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const POPULATIONS: [(usize, usize); 3] = [(100, 10), (1_000, 100), (10_000, 1_000)];

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("platform.iterate");

    for (users, creators) in POPULATIONS {
        group.throughput(Throughput::Elements(users as u64));
        group.bench_with_input(
            BenchmarkId::new("single_alpha", format!("{users}x{creators}")),
            &(users, creators),
            |b, &(users, creators)| {
                b.iter(|| {
                    let mut rng = DeterministicRng::new(0xC0FFEE);
                    let config = PlatformConfig {
                        num_users: users,
                        num_creators: creators,
                        alphas: vec![1.0],
                        evolution_interval: 0,
                        max_follows: 0,
                    };
                    let mut platform = Platform::new(config, &mut rng).expect("valid config");
                    for _ in 0..10 {
                        black_box(platform.iterate().expect("iterate"));
                    }
                    black_box(platform.timestep())
                });
            },
        );
    }

    group.finish();
}

fn bench_mixture(c: &mut Criterion) {
    let mut group = c.benchmark_group("platform.mixture");

    for alphas in [1_usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("alphas", alphas), &alphas, |b, &alphas| {
            b.iter(|| {
                let mut rng = DeterministicRng::new(7);
                #[allow(clippy::cast_precision_loss)]
                let config = PlatformConfig {
                    num_users: 1_000,
                    num_creators: 100,
                    alphas: (0..alphas).map(|i| i as f64 * 0.25).collect(),
                    evolution_interval: 5,
                    max_follows: 0,
                };
                let mut platform = Platform::new(config, &mut rng).expect("valid config");
                for _ in 0..10 {
                    black_box(platform.iterate().expect("iterate"));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_iterate, bench_mixture);
criterion_main!(benches);

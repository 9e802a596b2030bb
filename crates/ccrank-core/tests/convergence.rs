//! Scenario and statistical tests for convergence behaviour.

use ccrank_core::{DeterministicRng, Platform, PlatformConfig, RecommendationSampler};

fn run_until_converged(config: PlatformConfig, rng: &mut DeterministicRng, budget: u64) -> Vec<Option<u64>> {
    let mut platform = Platform::new(config, rng).expect("valid config");
    while platform.timestep() < budget {
        if platform.iterate().expect("iterate") {
            break;
        }
    }
    platform.into_report().found_at
}

#[test]
fn hundred_users_ten_creators_converges() {
    let config = PlatformConfig {
        num_users: 100,
        num_creators: 10,
        alphas: vec![1.0],
        evolution_interval: 0,
        max_follows: 0,
    };
    let mut rng = DeterministicRng::new(42);
    let mut platform = Platform::new(config, &mut rng).expect("valid config");

    while !platform.check_convergence() {
        let _ = platform.iterate().expect("iterate");
        assert!(platform.timestep() < 1000, "did not converge within 1000 steps");
    }

    let report = platform.into_report();
    assert!(report.converged);
    assert!(report.iterations < 1000);
    assert_eq!(report.found_at.len(), 100);
    assert!(report.found_at.iter().all(|f| matches!(f, Some(t) if *t >= 1)));
    // Everyone ends up following the top creator.
    assert_eq!(report.num_followers[0], 100);
    assert_eq!(report.mean_best_rank.last().copied().flatten(), Some(0.0));
}

#[test]
fn uniform_prior_matches_one_over_creators() {
    for creators in [1_usize, 2, 7, 50] {
        let sampler = RecommendationSampler::new(vec![2.5]).expect("valid");
        let probs = sampler.probabilities(&vec![0; creators]).expect("probs");
        #[allow(clippy::cast_precision_loss)]
        let expected = 1.0 / creators as f64;
        assert!(probs.iter().all(|p| (p - expected).abs() < 1e-12));
    }
}

#[test]
fn uniform_recommendations_give_geometric_first_success() {
    // With alpha = 0 and two creators every searching user is offered the
    // top creator with probability 1/2 per step, independently of the
    // follower counts, so first-success timesteps are Geometric(0.5).
    let config = PlatformConfig {
        num_users: 50,
        num_creators: 2,
        alphas: vec![0.0],
        evolution_interval: 0,
        max_follows: 0,
    };

    let mut rng = DeterministicRng::new(1234);
    let mut samples = Vec::new();
    for _ in 0..200 {
        let found = run_until_converged(config.clone(), &mut rng, 200);
        samples.extend(found.into_iter().map(|f| f.expect("converged")));
    }

    #[allow(clippy::cast_precision_loss)]
    let n = samples.len() as f64;
    assert!((n - 10_000.0).abs() < f64::EPSILON);

    #[allow(clippy::cast_precision_loss)]
    let mean = samples.iter().sum::<u64>() as f64 / n;
    assert!((mean - 2.0).abs() < 0.1, "mean first-success timestep {mean}");

    for (k, expected) in [(1_u64, 0.5), (2, 0.25), (3, 0.125), (4, 0.0625)] {
        #[allow(clippy::cast_precision_loss)]
        let observed = samples.iter().filter(|t| **t == k).count() as f64 / n;
        assert!(
            (observed - expected).abs() < 0.03,
            "P(T={k}) observed {observed}, expected {expected}"
        );
    }
}

#[test]
fn same_seed_same_convergence_timesteps() {
    let config = PlatformConfig {
        num_users: 60,
        num_creators: 12,
        alphas: vec![0.5, 1.5],
        evolution_interval: 5,
        max_follows: 3,
    };
    let a = run_until_converged(config.clone(), &mut DeterministicRng::new(99), 5_000);
    let b = run_until_converged(config, &mut DeterministicRng::new(99), 5_000);
    assert_eq!(a, b);
}

#[test]
fn stronger_popularity_bias_does_not_block_convergence() {
    let config = PlatformConfig {
        num_users: 40,
        num_creators: 5,
        alphas: vec![2.0],
        evolution_interval: 0,
        max_follows: 0,
    };
    let found = run_until_converged(config, &mut DeterministicRng::new(7), 20_000);
    assert!(found.iter().all(Option::is_some));
}

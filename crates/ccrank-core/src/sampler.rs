//! Multi-alpha preferential-attachment recommendation sampler.
//!
//! # Algorithm
//!
//! For every bias exponent `alpha` the sampler builds a Laplace-smoothed
//! preferential-attachment kernel over creators:
//!
//! ```text
//! w_alpha(c) = (followers(c) + 1) ^ alpha
//! p_alpha(c) = w_alpha(c) / Σ w_alpha
//! ```
//!
//! The final distribution is the uniform mixture of the `p_alpha`. One
//! creator is then drawn per user, with replacement, in ascending user order.
//!
//! Weights are normalized in log space. Each log count is first shifted by
//! the largest (for `alpha >= 0`) or smallest (for `alpha < 0`) log count
//! and only then scaled by `alpha`, so every exponent is `<= 0` and any
//! finite `alpha` yields a finite kernel whose peak weight is exactly 1.

use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

use crate::error::PlatformError;
use crate::model::CreatorId;

/// One timestep's worth of recommendations.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    /// Recommended creator per user, indexed by user id.
    pub creators: Vec<CreatorId>,
    /// Mixture distribution the recommendations were drawn from, indexed by creator id.
    pub probabilities: Vec<f64>,
}

/// Sampler holding the validated list of bias exponents.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSampler {
    alphas: Vec<f64>,
}

impl RecommendationSampler {
    /// Validate `alphas` and build a sampler.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::EmptyAlphas`] for an empty list and
    /// [`PlatformError::NonFiniteAlpha`] for NaN or infinite entries.
    pub fn new(alphas: Vec<f64>) -> Result<Self, PlatformError> {
        if alphas.is_empty() {
            return Err(PlatformError::EmptyAlphas);
        }
        if let Some((index, &value)) = alphas.iter().enumerate().find(|(_, a)| !a.is_finite()) {
            return Err(PlatformError::NonFiniteAlpha { index, value });
        }
        Ok(Self { alphas })
    }

    /// Compute the mixture distribution over creators for the given follower counts.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DegenerateDistribution`] when there are no
    /// creators or a kernel does not normalize to a finite positive mass.
    pub fn probabilities(&self, followers: &[usize]) -> Result<Vec<f64>, PlatformError> {
        if followers.is_empty() {
            return Err(PlatformError::DegenerateDistribution(
                "no creators to recommend".to_string(),
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let log_smoothed: Vec<f64> = followers.iter().map(|&n| ((n + 1) as f64).ln()).collect();

        #[allow(clippy::cast_precision_loss)]
        let share = 1.0 / self.alphas.len() as f64;
        let mut mixture = vec![0.0; followers.len()];
        let most = log_smoothed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let least = log_smoothed.iter().copied().fold(f64::INFINITY, f64::min);

        for &alpha in &self.alphas {
            let reference = if alpha >= 0.0 { most } else { least };
            let weights: Vec<f64> = log_smoothed
                .iter()
                .map(|l| (alpha * (l - reference)).exp())
                .collect();
            let total: f64 = weights.iter().sum();

            if !total.is_finite() || total <= 0.0 {
                return Err(PlatformError::DegenerateDistribution(format!(
                    "alpha={alpha} produced total weight {total}"
                )));
            }

            for (slot, weight) in mixture.iter_mut().zip(&weights) {
                *slot += share * weight / total;
            }
        }

        Ok(mixture)
    }

    /// Draw one recommended creator for each of `num_users` users.
    ///
    /// Every user gets a draw, converged or not, so the random stream
    /// consumed per timestep depends only on the population size.
    ///
    /// # Errors
    ///
    /// Propagates [`probabilities`](Self::probabilities) errors, and returns
    /// [`PlatformError::DegenerateDistribution`] if the weights are rejected
    /// by the weighted sampler.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        followers: &[usize],
        num_users: usize,
        rng: &mut R,
    ) -> Result<Recommendations, PlatformError> {
        let probabilities = self.probabilities(followers)?;
        let index = WeightedIndex::new(&probabilities)
            .map_err(|err| PlatformError::DegenerateDistribution(err.to_string()))?;

        let creators = (0..num_users)
            .map(|_| CreatorId(index.sample(rng)))
            .collect();

        Ok(Recommendations {
            creators,
            probabilities,
        })
    }
}

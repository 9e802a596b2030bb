/// Errors raised while constructing or stepping a [`Platform`](crate::Platform).
///
/// Every variant is a configuration or programming error. Nothing here is
/// transient, so callers should not retry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlatformError {
    /// No bias exponents were supplied.
    #[error("alphas must contain at least one bias exponent")]
    EmptyAlphas,

    /// A bias exponent is NaN or infinite.
    #[error("alpha at index {index} is not finite: {value}")]
    NonFiniteAlpha {
        /// Position in the alpha list.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// The population has no users.
    #[error("num_users must be > 0")]
    NoUsers,

    /// There are no content creators to recommend.
    #[error("num_creators must be > 0")]
    NoCreators,

    /// The recommendation weights could not be turned into a distribution.
    #[error("degenerate recommendation distribution: {0}")]
    DegenerateDistribution(String),
}

#[cfg(test)]
mod tests {
    use super::PlatformError;

    #[test]
    fn messages_name_the_offending_parameter() {
        let err = PlatformError::NonFiniteAlpha {
            index: 2,
            value: f64::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("index 2"), "{msg}");
        assert!(msg.contains("NaN"), "{msg}");

        assert!(PlatformError::NoCreators.to_string().contains("num_creators"));
    }
}

use crate::core::ModelError;

/// Automatic re-execution of transaction bodies that hit a write conflict.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first run included.
    pub max_attempts: usize,
    /// Base duration in milliseconds for backoff calculation.
    pub base_backoff_ms: u64,
    /// Maximum duration in milliseconds for backoff.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_backoff_ms: 5,
            max_backoff_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base backoff
    pub fn base_backoff_ms(mut self, ms: u64) -> Self {
        self.base_backoff_ms = ms;
        self
    }

    /// Set the backoff cap
    pub fn max_backoff_ms(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    pub fn should_retry(&self, attempt: usize, err: &ModelError) -> bool {
        attempt < self.max_attempts.max(1) && err.is_retryable()
    }

    /// Exponential backoff before the attempt following `attempt`.
    pub fn backoff_ms(&self, attempt: usize) -> u64 {
        let base = self.base_backoff_ms.max(1);
        let cap = self.max_backoff_ms.max(base);

        let mut backoff = base;
        for _ in 1..attempt {
            backoff = backoff.saturating_mul(2).min(cap);
        }
        backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::new().base_backoff_ms(10).max_backoff_ms(35);
        assert_eq!(policy.backoff_ms(1), 10);
        assert_eq!(policy.backoff_ms(2), 20);
        assert_eq!(policy.backoff_ms(3), 35);
        assert_eq!(policy.backoff_ms(8), 35);
    }

    #[test]
    fn test_only_conflicts_are_retried() {
        let policy = RetryPolicy::new().max_attempts(3);
        let conflict = ModelError::WriteConflict("row 1".into());
        let other = ModelError::PersistenceError("disk full".into());

        assert!(policy.should_retry(1, &conflict));
        assert!(policy.should_retry(2, &conflict));
        assert!(!policy.should_retry(3, &conflict));
        assert!(!policy.should_retry(1, &other));
        assert!(!RetryPolicy::default().should_retry(1, &conflict));
    }
}

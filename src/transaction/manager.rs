// ============================================================================
// Transaction Manager
// ============================================================================

use super::{EventDispatcher, RetryPolicy, TransactionEvent};
use crate::core::{ModelError, Result};
use log::warn;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tracks transaction nesting for one unit of work and publishes
/// lifecycle events.
///
/// Events are dispatched after the nesting level has changed, so listeners
/// observe the level being returned to.
pub struct TransactionManager {
    level: AtomicUsize,
    events: Arc<EventDispatcher>,
    policy: RetryPolicy,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            level: AtomicUsize::new(0),
            events: Arc::new(EventDispatcher::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// Current nesting level; 0 when no transaction is open.
    pub fn level(&self) -> usize {
        self.level.load(Ordering::SeqCst)
    }

    pub fn in_transaction(&self) -> bool {
        self.level() > 0
    }

    /// Opens a (possibly nested) transaction and returns its level.
    pub fn begin(&self) -> Result<usize> {
        let level = self.level.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.dispatch(TransactionEvent::Began { level })?;
        Ok(level)
    }

    /// Commits the innermost transaction.
    ///
    /// The level is decremented before listeners run; an error returned by a
    /// listener does not undo the commit.
    pub fn commit(&self) -> Result<()> {
        let level = self.leave("commit")?;
        self.events.dispatch(TransactionEvent::Committed { level })
    }

    /// Rolls back the innermost transaction.
    pub fn rollback(&self) -> Result<()> {
        let level = self.leave("roll back")?;
        self.events.dispatch(TransactionEvent::RolledBack { level })
    }

    fn leave(&self, action: &str) -> Result<usize> {
        self.level
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |level| level.checked_sub(1))
            .map(|previous| previous - 1)
            .map_err(|_| {
                ModelError::TransactionError(format!(
                    "Cannot {} without an active transaction",
                    action
                ))
            })
    }

    /// Runs `operation` inside a transaction, committing on success and
    /// rolling back on error.
    ///
    /// A body failing with a write conflict is executed again, from a fresh
    /// transaction, according to the manager's `RetryPolicy`.
    pub async fn transaction<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1usize;
        loop {
            self.begin()?;
            match operation().await {
                Ok(value) => {
                    self.commit()?;
                    return Ok(value);
                }
                Err(err) => {
                    if let Err(rollback_err) = self.rollback() {
                        warn!(
                            "TransactionManager.transaction rollback failed: {} (body error: {})",
                            rollback_err, err
                        );
                        return Err(err);
                    }
                    if !self.policy.should_retry(attempt, &err) {
                        return Err(err);
                    }

                    let backoff_ms = self.policy.backoff_ms(attempt);
                    warn!(
                        "TransactionManager.transaction retry on conflict (attempt {} of {}): {} (backoff={}ms)",
                        attempt,
                        self.policy.max_attempts.max(1),
                        err,
                        backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
            }
        }
    }
}

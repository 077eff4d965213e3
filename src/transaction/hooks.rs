use super::{TransactionEvent, TransactionEventKind, TransactionManager};
use crate::core::Result;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Callback deferred until the outermost transaction commits.
pub type Processor = Box<dyn FnOnce() -> Result<()> + Send>;

/// Processors keyed by the nesting level they were registered at.
#[derive(Default)]
struct ProcessorQueue {
    levels: BTreeMap<usize, Vec<Processor>>,
}

impl ProcessorQueue {
    fn push(&mut self, level: usize, processor: Processor) {
        self.levels.entry(level).or_default().push(processor);
    }

    /// Empties the queue, outermost level first.
    fn take_all(&mut self) -> Vec<Processor> {
        std::mem::take(&mut self.levels)
            .into_values()
            .flatten()
            .collect()
    }

    /// Drops everything registered deeper than `level`.
    fn discard_above(&mut self, level: usize) -> usize {
        let discarded = self.levels.split_off(&(level + 1));
        discarded.values().map(Vec::len).sum()
    }

    fn len(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Defers callbacks until the outermost transaction of a
/// [`TransactionManager`] commits.
///
/// Listeners are subscribed once, when the hooks are created. Callbacks
/// registered inside a transaction that is rolled back are discarded, so a
/// retried transaction body that registers them again runs them only once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use model_concerns::transaction::{AfterCommitHooks, TransactionManager};
///
/// # fn main() -> model_concerns::Result<()> {
/// let manager = Arc::new(TransactionManager::new());
/// let hooks = AfterCommitHooks::new(Arc::clone(&manager))?;
/// let sent = Arc::new(AtomicUsize::new(0));
///
/// manager.begin()?;
/// let counter = Arc::clone(&sent);
/// hooks.after_transaction_committed(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// })?;
/// assert_eq!(sent.load(Ordering::SeqCst), 0);
///
/// manager.commit()?;
/// assert_eq!(sent.load(Ordering::SeqCst), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AfterCommitHooks {
    manager: Arc<TransactionManager>,
    queue: Arc<Mutex<ProcessorQueue>>,
}

impl AfterCommitHooks {
    pub fn new(manager: Arc<TransactionManager>) -> Result<Self> {
        let queue = Arc::new(Mutex::new(ProcessorQueue::default()));

        let commit_queue = Arc::clone(&queue);
        manager
            .events()
            .listen(TransactionEventKind::Committed, move |event| {
                Self::on_committed(&commit_queue, event)
            })?;

        let rollback_queue = Arc::clone(&queue);
        manager
            .events()
            .listen(TransactionEventKind::RolledBack, move |event| {
                Self::on_rolled_back(&rollback_queue, event)
            })?;

        Ok(Self { manager, queue })
    }

    pub fn manager(&self) -> &Arc<TransactionManager> {
        &self.manager
    }

    /// Runs `processor` now when no transaction is open, otherwise once the
    /// outermost transaction commits.
    pub fn after_transaction_committed<F>(&self, processor: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let level = self.manager.level();
        if level == 0 {
            return processor();
        }

        self.queue.lock()?.push(level, Box::new(processor));
        debug!("Deferred processor until commit (level {})", level);
        Ok(())
    }

    /// Number of processors waiting for a commit.
    pub fn pending(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    fn on_committed(queue: &Mutex<ProcessorQueue>, event: &TransactionEvent) -> Result<()> {
        if event.level() > 0 {
            return Ok(());
        }

        // The queue is emptied before anything runs: a processor may open
        // and commit a transaction of its own.
        let processors = {
            let mut queue = queue.lock()?;
            if queue.is_empty() {
                return Ok(());
            }
            queue.take_all()
        };

        debug!("Running {} processors after commit", processors.len());
        for processor in processors {
            processor()?;
        }
        Ok(())
    }

    fn on_rolled_back(queue: &Mutex<ProcessorQueue>, event: &TransactionEvent) -> Result<()> {
        let discarded = queue.lock()?.discard_above(event.level());
        if discarded > 0 {
            debug!(
                "Discarded {} processors after rollback to level {}",
                discarded,
                event.level()
            );
        }
        Ok(())
    }
}

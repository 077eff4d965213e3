use crate::core::Result;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionEventKind {
    Began,
    Committed,
    RolledBack,
}

/// Transaction lifecycle event.
///
/// `level` is the nesting level once the transition has happened: 1 after
/// beginning an outermost transaction, 0 after committing or rolling it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEvent {
    Began { level: usize },
    Committed { level: usize },
    RolledBack { level: usize },
}

impl TransactionEvent {
    pub fn kind(&self) -> TransactionEventKind {
        match self {
            Self::Began { .. } => TransactionEventKind::Began,
            Self::Committed { .. } => TransactionEventKind::Committed,
            Self::RolledBack { .. } => TransactionEventKind::RolledBack,
        }
    }

    pub fn level(&self) -> usize {
        match self {
            Self::Began { level } | Self::Committed { level } | Self::RolledBack { level } => *level,
        }
    }
}

pub type Listener = Arc<dyn Fn(&TransactionEvent) -> Result<()> + Send + Sync>;

/// Synchronous publish/subscribe for transaction events.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<(TransactionEventKind, Listener)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F>(&self, kind: TransactionEventKind, listener: F) -> Result<()>
    where
        F: Fn(&TransactionEvent) -> Result<()> + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write()?;
        listeners.push((kind, Arc::new(listener)));
        Ok(())
    }

    pub fn listener_count(&self, kind: TransactionEventKind) -> usize {
        self.listeners
            .read()
            .map(|listeners| listeners.iter().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    /// Calls the listeners for `event` in subscription order, stopping at
    /// the first error.
    ///
    /// Listeners run without the registry locked, so they may subscribe or
    /// dispatch further events themselves.
    pub fn dispatch(&self, event: TransactionEvent) -> Result<()> {
        let matching: Vec<Listener> = {
            let listeners = self.listeners.read()?;
            listeners
                .iter()
                .filter(|(kind, _)| *kind == event.kind())
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        for listener in matching {
            listener(&event)?;
        }
        Ok(())
    }
}

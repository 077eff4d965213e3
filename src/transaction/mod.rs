// ============================================================================
// Transaction Lifecycle
// ============================================================================
//
// `TransactionManager` tracks nesting and publishes Began / Committed /
// RolledBack events. `AfterCommitHooks` listens to them to run deferred
// processors once the outermost transaction commits, and to discard the
// ones registered inside a rolled back (sub)transaction.
//
// ============================================================================

pub mod events;
pub mod hooks;
pub mod manager;
pub mod policy;

pub use events::{EventDispatcher, Listener, TransactionEvent, TransactionEventKind};
pub use hooks::{AfterCommitHooks, Processor};
pub use manager::TransactionManager;
pub use policy::RetryPolicy;

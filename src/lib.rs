// ============================================================================
// model_concerns Library
// ============================================================================
//
// Cross-cutting behaviour mixed into host ORM models and services:
//
// - `auth`        - ownership / capability authorization
// - `properties`  - additional properties and their persisted rows
// - `transaction` - callbacks deferred until the outermost commit
//
// ============================================================================

pub mod auth;
pub mod core;
pub mod model;
pub mod properties;
pub mod transaction;

// Re-export main types for convenience
pub use crate::core::{ModelError, Result, Value};
pub use crate::model::{Model, MutatorRegistry, Record};

pub use crate::auth::{AuthGuard, AuthResolver, Authorizer, Principal, ServicePrincipal};
pub use crate::properties::{
    AdditionalProperties, HasAdditionalProperties, HasProperties, MemoryPropertyStore,
    PropertyCache, PropertyRow, PropertyStore,
};
pub use crate::transaction::{AfterCommitHooks, RetryPolicy, TransactionEvent, TransactionManager};

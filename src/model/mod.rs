// ============================================================================
// Host Model Contract
// ============================================================================
//
// The concerns in this crate are mixed into models owned by a host ORM.
// `Model` is the slice of that host contract they rely on; `Record` is an
// attribute-map implementation of it.
//
// ============================================================================

pub mod mutators;
pub mod record;

pub use mutators::{Mutator, MutatorRegistry};
pub use record::Record;

use crate::core::Value;
use std::collections::BTreeMap;

/// Name of the foreign key that ties a record to the user owning it.
pub const OWNER_FOREIGN_KEY: &str = "user_id";

/// Attribute access and identity of a host model.
pub trait Model: Send + Sync {
    /// Type identity used to decide whether two models are of the same kind.
    fn model_type(&self) -> &str;

    /// Value of the identity (primary) key, `Value::Null` while unsaved.
    fn key(&self) -> Value;

    /// Native attribute resolution.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Native attributes that take part in serialization.
    fn attributes(&self) -> BTreeMap<String, Value>;

    /// Identity key of the owning user.
    fn owner_key(&self) -> Option<Value> {
        self.attribute(OWNER_FOREIGN_KEY)
    }
}

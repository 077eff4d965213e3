use crate::core::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-key value transformation.
pub type Mutator = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Set and get mutators keyed by property name.
///
/// Populated when an entity type is defined; a key without a registered
/// mutator passes values through unchanged.
///
/// # Examples
///
/// ```
/// use model_concerns::{MutatorRegistry, Value};
///
/// let mutators = MutatorRegistry::new()
///     .with_setter("color", |v| Value::from(v.to_string().to_lowercase()));
///
/// assert_eq!(mutators.apply_setter("color", "RED".into()), Value::from("red"));
/// assert_eq!(mutators.apply_setter("size", "XL".into()), Value::from("XL"));
/// ```
#[derive(Clone, Default)]
pub struct MutatorRegistry {
    setters: HashMap<String, Mutator>,
    getters: HashMap<String, Mutator>,
}

impl MutatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mutator applied when `key` is written
    pub fn with_setter<F>(mut self, key: &str, mutator: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.setters.insert(key.to_string(), Arc::new(mutator));
        self
    }

    /// Register the mutator applied when `key` is read
    pub fn with_getter<F>(mut self, key: &str, mutator: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.getters.insert(key.to_string(), Arc::new(mutator));
        self
    }

    pub fn has_setter(&self, key: &str) -> bool {
        self.setters.contains_key(key)
    }

    pub fn has_getter(&self, key: &str) -> bool {
        self.getters.contains_key(key)
    }

    pub fn apply_setter(&self, key: &str, value: Value) -> Value {
        match self.setters.get(key) {
            Some(mutator) => mutator(value),
            None => value,
        }
    }

    pub fn apply_getter(&self, key: &str, value: Value) -> Value {
        match self.getters.get(key) {
            Some(mutator) => mutator(value),
            None => value,
        }
    }
}

impl fmt::Debug for MutatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut setters: Vec<&String> = self.setters.keys().collect();
        let mut getters: Vec<&String> = self.getters.keys().collect();
        setters.sort();
        getters.sort();
        f.debug_struct("MutatorRegistry")
            .field("setters", &setters)
            .field("getters", &getters)
            .finish()
    }
}

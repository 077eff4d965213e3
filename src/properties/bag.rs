use crate::core::Value;
use crate::model::{Model, MutatorRegistry};
use std::collections::BTreeMap;

/// Key/value overlay kept next to a model's native attributes.
#[derive(Debug, Clone, Default)]
pub struct AdditionalProperties {
    values: BTreeMap<String, Value>,
    mutators: MutatorRegistry,
}

impl AdditionalProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mutators(mutators: MutatorRegistry) -> Self {
        Self {
            values: BTreeMap::new(),
            mutators,
        }
    }

    pub fn mutators(&self) -> &MutatorRegistry {
        &self.mutators
    }

    /// Stores `value` under `key` after passing it through the key's set
    /// mutator, if one is registered.
    pub fn set(&mut self, key: &str, value: Value) -> &mut Self {
        let value = self.mutators.apply_setter(key, value);
        self.set_raw(key, value)
    }

    /// Stores `value` verbatim.
    pub fn set_raw(&mut self, key: &str, value: Value) -> &mut Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// Stored value for `key`; a null entry counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|value| !value.is_null())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Mixes an [`AdditionalProperties`] bag into a model.
///
/// Implementors only expose the bag; reads, writes and serialization are
/// provided.
pub trait HasAdditionalProperties: Model {
    fn additional_properties(&self) -> &AdditionalProperties;

    fn additional_properties_mut(&mut self) -> &mut AdditionalProperties;

    fn set_additional_property(&mut self, key: &str, value: impl Into<Value>) -> &mut Self
    where
        Self: Sized,
    {
        self.additional_properties_mut().set(key, value.into());
        self
    }

    fn set_raw_additional_property(&mut self, key: &str, value: impl Into<Value>) -> &mut Self
    where
        Self: Sized,
    {
        self.additional_properties_mut().set_raw(key, value.into());
        self
    }

    fn get_additional_property(&self, key: &str) -> Option<&Value> {
        self.additional_properties().get(key)
    }

    /// Two-tier attribute lookup: the bag first (through the key's get
    /// mutator), then the model's native attributes.
    fn resolve_attribute(&self, key: &str) -> Option<Value> {
        let bag = self.additional_properties();
        match bag.get(key) {
            Some(value) => Some(bag.mutators().apply_getter(key, value.clone())),
            None => self.attribute(key),
        }
    }

    /// Native attributes merged with the bag; bag entries win on collision.
    fn arrayable_attributes(&self) -> BTreeMap<String, Value> {
        let mut attributes = self.attributes();
        for (key, value) in self.additional_properties().iter() {
            attributes.insert(key.clone(), value.clone());
        }
        attributes
    }

    fn to_json(&self) -> serde_json::Value {
        let object = self
            .arrayable_attributes()
            .into_iter()
            .map(|(key, value)| (key, value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}

use super::Model;
use crate::core::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A model backed by a plain attribute map.
///
/// # Examples
///
/// ```
/// use model_concerns::model::{Model, Record};
///
/// let post = Record::new("posts").with("id", 10).with("user_id", 3);
/// assert_eq!(post.key(), 10.into());
/// assert_eq!(post.owner_key(), Some(3.into()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    model_type: String,
    key_name: String,
    attributes: BTreeMap<String, Value>,
}

impl Record {
    const DEFAULT_KEY_NAME: &'static str = "id";

    /// Creates an empty record keyed by `id`.
    pub fn new(model_type: &str) -> Self {
        Self {
            model_type: model_type.to_string(),
            key_name: Self::DEFAULT_KEY_NAME.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    /// Use a different attribute as the identity key
    pub fn key_name(mut self, key_name: &str) -> Self {
        self.key_name = key_name.to_string();
        self
    }

    /// Set an attribute (builder form)
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get_key_name(&self) -> &str {
        &self.key_name
    }
}

impl Model for Record {
    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn key(&self) -> Value {
        self.attributes
            .get(&self.key_name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }

    fn attributes(&self) -> BTreeMap<String, Value> {
        self.attributes.clone()
    }
}

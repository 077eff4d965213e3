use crate::core::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted `property` / `property_value` pair owned by one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    id: Option<u64>,
    pub property: String,
    pub property_value: Value,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    was_recently_created: bool,
}

impl PropertyRow {
    /// Creates an unsaved row for `property` with no value.
    pub fn new(property: &str) -> Self {
        Self {
            id: None,
            property: property.to_string(),
            property_value: Value::Null,
            created_at: None,
            updated_at: None,
            was_recently_created: false,
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Whether the row has been persisted
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the last save inserted the row
    pub fn was_recently_created(&self) -> bool {
        self.was_recently_created
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Marks the row as inserted under `id`. Called by stores.
    pub fn mark_inserted(&mut self, id: u64, at: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(at);
        self.updated_at = Some(at);
        self.was_recently_created = true;
    }

    /// Marks an existing row as updated. Called by stores.
    pub fn mark_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
        self.was_recently_created = false;
    }

    /// Same persisted row, regardless of its current value
    pub fn is_same_row(&self, other: &PropertyRow) -> bool {
        self.id.is_some() && self.id == other.id
    }
}

use super::{HasAdditionalProperties, PropertyRow, PropertyStore};
use crate::core::{Result, Value};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

/// Property rows of one entity instance, loaded at most once.
#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    rows: Option<Vec<PropertyRow>>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.rows.is_some()
    }

    pub fn fill(&mut self, rows: Vec<PropertyRow>) {
        self.rows = Some(rows);
    }

    /// Cached rows; empty until loaded.
    pub fn rows(&self) -> &[PropertyRow] {
        self.rows.as_deref().unwrap_or(&[])
    }

    pub fn find(&self, property: &str) -> Option<&PropertyRow> {
        self.rows().iter().find(|row| row.property == property)
    }

    fn push(&mut self, row: PropertyRow) {
        self.rows.get_or_insert_with(Vec::new).push(row);
    }

    fn replace(&mut self, row: PropertyRow) {
        if let Some(rows) = self.rows.as_mut() {
            if let Some(cached) = rows.iter_mut().find(|cached| cached.is_same_row(&row)) {
                *cached = row;
            }
        }
    }

    /// Drops `row` if it is still cached.
    fn remove(&mut self, row: &PropertyRow) -> bool {
        let Some(rows) = self.rows.as_mut() else {
            return false;
        };
        match rows.iter().position(|cached| cached.is_same_row(row)) {
            Some(index) => {
                rows.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Keeps an entity's additional properties in sync with a table of
/// property rows.
///
/// Implementors supply the backing store, the allow-list of known keys and
/// storage for the per-instance cache.
#[async_trait]
pub trait HasProperties: HasAdditionalProperties + Send + Sync {
    fn property_store(&self) -> Arc<dyn PropertyStore>;

    /// Keys accepted by `save_properties` unless all keys are allowed.
    fn known_properties(&self) -> &[&str];

    fn property_cache(&self) -> &PropertyCache;

    fn property_cache_mut(&mut self) -> &mut PropertyCache;

    /// All property rows, loaded from the store on first use only.
    async fn get_properties<'a>(&'a mut self) -> Result<&'a [PropertyRow]> {
        if !self.property_cache().is_loaded() {
            let rows = self.property_store().all().await?;
            debug!("Loaded {} property rows for {}", rows.len(), self.model_type());
            self.property_cache_mut().fill(rows);
        }
        Ok(self.property_cache().rows())
    }

    async fn get_property<'a>(
        &'a mut self,
        key: &str,
    ) -> Result<Option<&'a PropertyRow>> {
        let rows = self.get_properties().await?;
        Ok(rows.iter().find(|row| row.property == key))
    }

    /// Hydrates the bag from `properties`, or from the cached rows when
    /// `None`, without running set mutators.
    async fn load_properties(&mut self, properties: Option<Vec<PropertyRow>>) -> Result<()> {
        let rows = match properties {
            Some(rows) => rows,
            None => self.get_properties().await?.to_vec(),
        };

        let bag = self.additional_properties_mut();
        for row in rows {
            bag.set_raw(&row.property, row.property_value);
        }
        Ok(())
    }

    /// Persists each pair in order.
    ///
    /// Keys outside `known_properties` are skipped unless `allow_all_props`.
    /// A row that fails to save is left out of both the cache and the bag and
    /// the remaining keys are still processed; only a failure to load the
    /// existing rows is returned as an error.
    async fn save_properties(
        &mut self,
        properties: Vec<(String, Value)>,
        allow_all_props: bool,
    ) -> Result<()> {
        self.get_properties().await?;
        let store = self.property_store();

        for (key, value) in properties {
            if !allow_all_props && !self.known_properties().contains(&key.as_str()) {
                debug!("Skipping unknown property '{}' on {}", key, self.model_type());
                continue;
            }

            let mut row = match self.property_cache().find(&key) {
                Some(row) => row.clone(),
                None => self.create_property(&key),
            };
            let value = self
                .additional_properties()
                .mutators()
                .apply_setter(&key, value);
            row.property_value = value.clone();

            if let Err(err) = store.save(&mut row).await {
                warn!(
                    "Failed to save property '{}' on {}: {}",
                    key,
                    self.model_type(),
                    err
                );
                continue;
            }

            if row.was_recently_created() {
                self.property_cache_mut().push(row);
            } else {
                self.property_cache_mut().replace(row);
            }
            self.additional_properties_mut().set_raw(&key, value);
        }

        Ok(())
    }

    /// Deletes the row for `key`, evicting it from the cache and the bag.
    ///
    /// Succeeds without touching the store when no row exists. A row the
    /// store no longer holds is still evicted from the cache; the bag keeps
    /// its value.
    async fn delete_property(&mut self, key: &str) -> Result<bool> {
        let row = match self.get_property(key).await? {
            Some(row) => row.clone(),
            None => return Ok(true),
        };

        let deleted = self.property_store().delete(&row).await?;
        self.property_cache_mut().remove(&row);
        if deleted {
            self.additional_properties_mut().remove(key);
        } else {
            debug!("Property '{}' on {} was already gone", key, self.model_type());
        }
        Ok(deleted)
    }

    /// Unsaved row for `key`; the caller sets the value and persists it.
    fn create_property(&self, key: &str) -> PropertyRow {
        PropertyRow::new(key)
    }
}

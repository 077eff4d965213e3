use super::PropertyRow;
use crate::core::{ModelError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Persistence for one entity's property rows.
///
/// A store is already scoped to its owning entity, so `all` returns that
/// entity's rows only.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Loads every row, in insertion order.
    async fn all(&self) -> Result<Vec<PropertyRow>>;

    /// Inserts an unsaved row or updates an existing one in place.
    async fn save(&self, row: &mut PropertyRow) -> Result<()>;

    /// Deletes a persisted row. Returns whether a row was removed.
    async fn delete(&self, row: &PropertyRow) -> Result<bool>;
}

/// In-memory property table.
///
/// `property` is unique within the store: inserting a second row for a key
/// that already exists is a constraint violation.
pub struct MemoryPropertyStore {
    rows: RwLock<Vec<PropertyRow>>,
    next_id: AtomicU64,
    loads: AtomicU64,
}

impl Default for MemoryPropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            loads: AtomicU64::new(0),
        }
    }

    /// Number of times `all` has been served
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Looks a row up by key, bypassing any entity-side cache
    pub async fn find(&self, property: &str) -> Option<PropertyRow> {
        let rows = self.rows.read().await;
        rows.iter().find(|row| row.property == property).cloned()
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn all(&self) -> Result<Vec<PropertyRow>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.read().await.clone())
    }

    async fn save(&self, row: &mut PropertyRow) -> Result<()> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();

        match row.id() {
            Some(id) => {
                let stored = rows
                    .iter_mut()
                    .find(|stored| stored.id() == Some(id))
                    .ok_or_else(|| {
                        ModelError::PersistenceError(format!("Property row {} not found", id))
                    })?;
                row.mark_updated(now);
                *stored = row.clone();
            }
            None => {
                if rows.iter().any(|stored| stored.property == row.property) {
                    return Err(ModelError::ConstraintViolation(format!(
                        "Property '{}' already exists",
                        row.property
                    )));
                }
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                row.mark_inserted(id, now);
                let mut stored = row.clone();
                stored.mark_updated(now);
                rows.push(stored);
            }
        }

        Ok(())
    }

    async fn delete(&self, row: &PropertyRow) -> Result<bool> {
        let Some(id) = row.id() else {
            return Ok(false);
        };

        let mut rows = self.rows.write().await;
        let len_before = rows.len();
        rows.retain(|stored| stored.id() != Some(id));
        Ok(len_before != rows.len())
    }
}

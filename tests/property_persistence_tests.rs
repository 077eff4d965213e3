/// Property persistence tests
///
/// Syncing an entity's additional properties with its property rows.
/// Run with: cargo test --test property_persistence_tests
use async_trait::async_trait;
use model_concerns::{
    AdditionalProperties, HasAdditionalProperties, HasProperties, MemoryPropertyStore, Model,
    ModelError, MutatorRegistry, PropertyCache, PropertyRow, PropertyStore, Record, Result, Value,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const PRODUCT_PROPERTIES: &[&str] = &["color", "size", "weight"];

struct Product {
    record: Record,
    extra: AdditionalProperties,
    store: Arc<dyn PropertyStore>,
    cache: PropertyCache,
}

impl Product {
    fn new(store: Arc<dyn PropertyStore>) -> Self {
        let mutators = MutatorRegistry::new()
            .with_setter("color", |v| Value::from(v.to_string().to_lowercase()))
            .with_setter("weight", |v| Value::from(v.as_f64().unwrap_or(0.0) * 1000.0));

        Self {
            record: Record::new("products").with("id", 1).with("sku", "TSHIRT-01"),
            extra: AdditionalProperties::with_mutators(mutators),
            store,
            cache: PropertyCache::new(),
        }
    }
}

impl Model for Product {
    fn model_type(&self) -> &str {
        self.record.model_type()
    }

    fn key(&self) -> Value {
        self.record.key()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.record.attribute(name)
    }

    fn attributes(&self) -> BTreeMap<String, Value> {
        self.record.attributes()
    }
}

impl HasAdditionalProperties for Product {
    fn additional_properties(&self) -> &AdditionalProperties {
        &self.extra
    }

    fn additional_properties_mut(&mut self) -> &mut AdditionalProperties {
        &mut self.extra
    }
}

impl HasProperties for Product {
    fn property_store(&self) -> Arc<dyn PropertyStore> {
        Arc::clone(&self.store)
    }

    fn known_properties(&self) -> &[&str] {
        PRODUCT_PROPERTIES
    }

    fn property_cache(&self) -> &PropertyCache {
        &self.cache
    }

    fn property_cache_mut(&mut self) -> &mut PropertyCache {
        &mut self.cache
    }
}

/// Store that refuses to save some keys.
struct FlakyStore {
    inner: MemoryPropertyStore,
    failing: HashSet<String>,
}

impl FlakyStore {
    fn failing_on(keys: &[&str]) -> Self {
        Self {
            inner: MemoryPropertyStore::new(),
            failing: keys.iter().map(|key| key.to_string()).collect(),
        }
    }
}

#[async_trait]
impl PropertyStore for FlakyStore {
    async fn all(&self) -> Result<Vec<PropertyRow>> {
        self.inner.all().await
    }

    async fn save(&self, row: &mut PropertyRow) -> Result<()> {
        if self.failing.contains(&row.property) {
            return Err(ModelError::PersistenceError(format!(
                "cannot write '{}'",
                row.property
            )));
        }
        self.inner.save(row).await
    }

    async fn delete(&self, row: &PropertyRow) -> Result<bool> {
        self.inner.delete(row).await
    }
}

fn pairs(items: &[(&str, Value)]) -> Vec<(String, Value)> {
    items
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn test_properties_are_loaded_once() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut seeded = PropertyRow::new("color");
    seeded.property_value = Value::from("red");
    store.save(&mut seeded).await.unwrap();

    let mut product = Product::new(store.clone());
    let first = product.get_properties().await.unwrap().to_vec();
    let second = product.get_properties().await.unwrap().to_vec();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(store.load_count(), 1);

    // Rows written behind the instance's back are not picked up.
    store.save(&mut PropertyRow::new("size")).await.unwrap();
    assert_eq!(product.get_properties().await.unwrap().len(), 1);
    assert_eq!(store.load_count(), 1);
}

#[tokio::test]
async fn test_save_get_delete_round_trip() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut product = Product::new(store.clone());

    assert_ok!(product.save_properties(pairs(&[("color", "RED".into())]), false).await);

    let row = product.get_property("color").await.unwrap().cloned().unwrap();
    assert_eq!(row.property_value, Value::from("red"));
    assert!(row.exists());
    assert_eq!(product.get_additional_property("color"), Some(&Value::from("red")));
    assert_eq!(store.find("color").await.unwrap().property_value, Value::from("red"));

    assert!(product.delete_property("color").await.unwrap());
    assert!(product.get_property("color").await.unwrap().is_none());
    assert_eq!(product.get_additional_property("color"), None);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_updating_a_property_keeps_its_row() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut product = Product::new(store.clone());

    product.save_properties(pairs(&[("weight", 1.5.into())]), false).await.unwrap();
    let id = product.get_property("weight").await.unwrap().unwrap().id();

    product.save_properties(pairs(&[("weight", 2.0.into())]), false).await.unwrap();
    let row = product.get_property("weight").await.unwrap().unwrap();
    assert_eq!(row.id(), id);
    assert_eq!(row.property_value, Value::Float(2000.0));

    assert_eq!(product.get_properties().await.unwrap().len(), 1);
    assert_eq!(store.len().await, 1);
    assert_eq!(product.get_additional_property("weight"), Some(&Value::Float(2000.0)));
}

#[tokio::test]
async fn test_unknown_keys_need_allow_all() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut product = Product::new(store.clone());

    product
        .save_properties(pairs(&[("secret", "x".into()), ("size", "M".into())]), false)
        .await
        .unwrap();
    assert!(store.find("secret").await.is_none());
    assert_eq!(product.get_additional_property("secret"), None);
    assert_eq!(product.get_additional_property("size"), Some(&Value::from("M")));

    product
        .save_properties(pairs(&[("secret", "x".into())]), true)
        .await
        .unwrap();
    assert_eq!(store.find("secret").await.unwrap().property_value, Value::from("x"));
    assert_eq!(product.get_additional_property("secret"), Some(&Value::from("x")));
}

#[tokio::test]
async fn test_failed_row_is_skipped_without_stopping_the_batch() {
    let store = Arc::new(FlakyStore::failing_on(&["size"]));
    let mut product = Product::new(store.clone());

    assert_ok!(
        product
            .save_properties(
                pairs(&[("color", "Blue".into()), ("size", "L".into()), ("weight", 0.25.into())]),
                false,
            )
            .await
    );

    assert_eq!(product.get_additional_property("color"), Some(&Value::from("blue")));
    assert_eq!(product.get_additional_property("size"), None);
    assert_eq!(product.get_additional_property("weight"), Some(&Value::Float(250.0)));

    let cached: Vec<String> = product
        .get_properties()
        .await
        .unwrap()
        .iter()
        .map(|row| row.property.clone())
        .collect();
    assert_eq!(cached, vec!["color".to_string(), "weight".to_string()]);
}

#[tokio::test]
async fn test_stale_instance_cannot_duplicate_a_key() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut first = Product::new(store.clone());
    let mut second = Product::new(store.clone());

    // Both instances cache an empty property set.
    first.get_properties().await.unwrap();
    second.get_properties().await.unwrap();

    first.save_properties(pairs(&[("color", "Red".into())]), false).await.unwrap();
    second.save_properties(pairs(&[("color", "Green".into())]), false).await.unwrap();

    assert_eq!(second.get_additional_property("color"), None);
    assert!(second.get_property("color").await.unwrap().is_none());
    assert_eq!(store.len().await, 1);
    assert_eq!(store.find("color").await.unwrap().property_value, Value::from("red"));
}

#[tokio::test]
async fn test_load_properties_skips_mutators() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut stored = PropertyRow::new("color");
    stored.property_value = Value::from("ORANGE");
    store.save(&mut stored).await.unwrap();

    let mut product = Product::new(store.clone());
    product.load_properties(None).await.unwrap();
    assert_eq!(product.get_additional_property("color"), Some(&Value::from("ORANGE")));

    let mut explicit = PropertyRow::new("size");
    explicit.property_value = Value::from("XS");
    product.load_properties(Some(vec![explicit])).await.unwrap();
    assert_eq!(product.get_additional_property("size"), Some(&Value::from("XS")));
    assert_eq!(store.load_count(), 1);
}

#[tokio::test]
async fn test_deleting_a_missing_property_is_a_noop() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut product = Product::new(store.clone());
    product.set_raw_additional_property("color", "teal");

    assert!(product.delete_property("color").await.unwrap());
    // Only rows are deleted; a bag entry without a row stays.
    assert_eq!(product.get_additional_property("color"), Some(&Value::from("teal")));
}

#[tokio::test]
async fn test_delete_reports_rows_removed_elsewhere() {
    let store = Arc::new(MemoryPropertyStore::new());
    let mut writer = Product::new(store.clone());
    writer.save_properties(pairs(&[("size", "S".into())]), false).await.unwrap();

    let mut reader = Product::new(store.clone());
    reader.load_properties(None).await.unwrap();
    assert!(writer.delete_property("size").await.unwrap());

    assert!(!reader.delete_property("size").await.unwrap());
    assert_eq!(reader.get_additional_property("size"), Some(&Value::from("S")));

    // The vanished row no longer shadows storage for this instance.
    assert!(reader.get_property("size").await.unwrap().is_none());
    assert!(reader.delete_property("size").await.unwrap());
    assert_eq!(store.load_count(), 2);
}

#[tokio::test]
async fn test_create_property_is_unsaved() {
    let product = Product::new(Arc::new(MemoryPropertyStore::new()));
    let row = product.create_property("material");

    assert_eq!(row.property, "material");
    assert!(row.property_value.is_null());
    assert!(!row.exists());
}

#[tokio::test]
async fn test_store_errors_on_load_are_returned() {
    struct BrokenStore;

    #[async_trait]
    impl PropertyStore for BrokenStore {
        async fn all(&self) -> Result<Vec<PropertyRow>> {
            Err(ModelError::PersistenceError("connection lost".into()))
        }

        async fn save(&self, _row: &mut PropertyRow) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _row: &PropertyRow) -> Result<bool> {
            Ok(true)
        }
    }

    let mut product = Product::new(Arc::new(BrokenStore));
    assert_err!(product.save_properties(pairs(&[("color", "Red".into())]), false).await);
    assert_eq!(product.get_additional_property("color"), None);
}

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, Once};

use rust_decimal::Decimal;
use storefront_coupons::{
    store::{RecordId, RecordStore, StoredRecord},
    CartView, CouponHooks, LineItem, ServiceError,
};

static TRACING: Once = Once::new();

/// Installs the test log subscriber once; `RUST_LOG` controls output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
struct StoreInner {
    next_id: RecordId,
    records: BTreeMap<RecordId, (String, StoredRecord)>,
    metadata: BTreeMap<RecordId, BTreeMap<String, Vec<String>>>,
}

/// In-memory stand-in for the host's record/metadata storage.
///
/// Title lookup is case-insensitive, the way a database collation
/// typically is; the loader's re-normalization check is what enforces
/// the exact match.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<StoreInner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_record(
        &self,
        record_type: &str,
        title: &str,
        published: bool,
        meta: &[(&str, &str)],
    ) -> RecordId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.insert(
            id,
            (
                record_type.to_owned(),
                StoredRecord {
                    id,
                    title: title.to_owned(),
                    published,
                },
            ),
        );
        inner.metadata.insert(
            id,
            meta.iter()
                .map(|(key, value)| ((*key).to_owned(), vec![(*value).to_owned()]))
                .collect(),
        );
        id
    }

    /// First stored metadata value, for asserting on writes.
    pub fn metadata_value(&self, id: RecordId, key: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .metadata
            .get(&id)
            .and_then(|meta| meta.get(key))
            .and_then(|values| values.first())
            .cloned()
    }
}

impl RecordStore for MemoryRecordStore {
    fn find_published_record_id(
        &self,
        record_type: &str,
        title: &str,
    ) -> Result<Option<RecordId>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .values()
            .find(|(stored_type, record)| {
                stored_type == record_type
                    && record.published
                    && record.title.eq_ignore_ascii_case(title)
            })
            .map(|(_, record)| record.id))
    }

    fn get_record(&self, id: RecordId) -> Result<Option<StoredRecord>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.records.get(&id).map(|(_, record)| record.clone()))
    }

    fn get_all_metadata(
        &self,
        id: RecordId,
    ) -> Result<BTreeMap<String, Vec<String>>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.metadata.get(&id).cloned().unwrap_or_default())
    }

    fn put_metadata(&self, id: RecordId, key: &str, value: &str) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .metadata
            .entry(id)
            .or_default()
            .insert(key.to_owned(), vec![value.to_owned()]);
        Ok(())
    }
}

/// Cart snapshot backed by plain vectors, for driving the evaluator.
#[derive(Default)]
pub struct TestCart {
    items: Vec<LineItem>,
    subtotal: Decimal,
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl TestCart {
    pub fn new(subtotal: Decimal) -> Self {
        Self {
            subtotal,
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_categories(mut self, product_id: &str, categories: &[&str]) -> Self {
        self.categories.insert(
            product_id.to_owned(),
            categories.iter().map(|c| (*c).to_owned()).collect(),
        );
        self
    }
}

impl CartView for TestCart {
    fn line_items(&self) -> &[LineItem] {
        &self.items
    }

    fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    fn product_categories(&self, product_id: &str) -> BTreeSet<String> {
        self.categories.get(product_id).cloned().unwrap_or_default()
    }
}

/// Hook set that lower-cases codes, the usual storefront transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseHooks;

impl CouponHooks for LowercaseHooks {
    fn normalize_code(&self, code: &str) -> String {
        code.to_lowercase()
    }
}

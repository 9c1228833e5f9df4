use std::collections::BTreeMap;

use crate::errors::ServiceError;

/// Identity of a row in the host's generic record store.
pub type RecordId = u64;

/// A generic record row. Coupons are stored as records of type
/// [`crate::services::coupons::COUPON_RECORD_TYPE`] whose title is the
/// coupon code and whose fields live in metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub title: String,
    pub published: bool,
}

/// Generic record/metadata storage supplied by the host framework.
///
/// Consistency of concurrent metadata writes is the store's problem;
/// the coupon core performs plain read-modify-write calls and does not
/// lock. Store faults propagate as [`ServiceError::Storage`] untouched.
pub trait RecordStore: Send + Sync {
    /// Id of the published record of `record_type` whose title equals
    /// `title`, if any.
    fn find_published_record_id(
        &self,
        record_type: &str,
        title: &str,
    ) -> Result<Option<RecordId>, ServiceError>;

    fn get_record(&self, id: RecordId) -> Result<Option<StoredRecord>, ServiceError>;

    /// Every metadata entry attached to a record. Values are lists;
    /// readers take the first entry.
    fn get_all_metadata(
        &self,
        id: RecordId,
    ) -> Result<BTreeMap<String, Vec<String>>, ServiceError>;

    /// Replaces the value stored under `key` for a record.
    fn put_metadata(&self, id: RecordId, key: &str, value: &str) -> Result<(), ServiceError>;
}

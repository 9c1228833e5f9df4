use thiserror::Error;

/// Faults surfaced while talking to the backing record store.
///
/// Business-rule failures are not errors; they come back as
/// [`crate::services::coupons::Validity`] values. A coupon lookup miss
/// is not an error either, it yields the not-found sentinel.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Fault raised by the record store, passed through untouched.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Wraps any store-side failure without reinterpreting it.
    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ServiceError::Storage(Box::new(error))
    }
}

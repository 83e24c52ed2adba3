use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong between receiving a checkout request and
/// committing (or refusing to commit) an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error("size '{size}' not available for product {product_id}")]
    SizeNotFound { product_id: Uuid, size: String },

    #[error("insufficient stock for product {product_id} size '{size}'")]
    InsufficientStock { product_id: Uuid, size: String },

    #[error("declared amount {declared} does not match expected total {expected}")]
    AmountMismatch { declared: i64, expected: i64 },

    #[error("payment signature verification failed")]
    SignatureInvalid,

    #[error("order not found")]
    OrderNotFound,

    #[error("integrity conflict: {0}")]
    IntegrityConflict(String),

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("internal error: {0}")]
    Internal(String),
}

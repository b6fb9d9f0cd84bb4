use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Only vendors can place orders")]
    NotAVendor,

    #[error("Your account is suspended. Please contact support.")]
    AccountSuspended,

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product is not available")]
    ProductInactive,

    #[error("Minimum order quantity is {0} {1}")]
    BelowMinimumQuantity(i32, String),

    #[error("No pricing information available for this product")]
    NoPricing,

    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("Buy now, pay later requires a minimum rating of {0}")]
    PayLaterNotEligible(f64),

    #[error("Bulk order window not found")]
    WindowNotFound,

    #[error("Bulk order window is no longer open")]
    WindowClosed,

    #[error("Bulk order window has expired")]
    WindowExpired,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Order payment is not pending")]
    NotPending,

    #[error("This order is not a pay later order")]
    NotPayLater,

    #[error("Order payment is overdue. Please contact support.")]
    PaymentOverdue,

    #[error("Invalid amount: must be positive")]
    InvalidAmount,

    #[error("Invalid quantity: must be positive")]
    InvalidQuantity,

    #[error("Invalid window duration: must be positive")]
    InvalidWindowDuration,
}

use crate::domain::customer::FieldErrors;
use crate::domain::money::Price;
use crate::domain::order::Step;
use crate::domain::ports::NotifyError;
use thiserror::Error;

/// Validation failures the shopper can fix by re-entering data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please fill in all details: {0}")]
    Fields(FieldErrors),
    #[error("Please enter the payment reference from your UPI app")]
    MissingPaymentReference,
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Cannot {action} while in the {from} step")]
    InvalidTransition { from: Step, action: &'static str },
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("Unknown variant {variant} for product {product}")]
    UnknownVariant { product: String, variant: String },
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),
    #[error("Delivery fee cannot be negative: {0}")]
    NegativeDeliveryFee(Price),
    #[error("Order error: {0}")]
    Notify(#[from] NotifyError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;

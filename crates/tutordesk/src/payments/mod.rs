/// Payment gateway: order creation and signature verification
mod client;
mod error;
pub mod signature;

pub use client::{PaymentOrder, PaymentsClient, PaymentsConfig};
pub use error::PaymentError;

mod error;
pub mod reporting;
mod service;
pub mod validate;

pub use error::BankError;
pub use service::{AccountRequest, Bank};

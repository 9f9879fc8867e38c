mod account;
mod client;
mod currency;
mod ledger;
mod money;
mod transaction;

pub use account::*;
pub use client::*;
pub use currency::*;
pub use ledger::*;
pub use money::*;
pub use transaction::*;

mod export;

pub use export::{BankSnapshot, Exporter};

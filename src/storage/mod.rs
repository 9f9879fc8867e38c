mod audit;
mod store;

pub use audit::AuditLog;
pub use store::FileStore;

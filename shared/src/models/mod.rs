//! Data models
//!
//! Shared between dine-server and its clients (via API).
//! All IDs are `i64`; all timestamps are Unix millis; all money is `Decimal`.

pub mod order;
pub mod payment;
pub mod reconciliation;

// Re-exports
pub use order::*;
pub use payment::*;
pub use reconciliation::*;

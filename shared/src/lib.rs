//! Shared types for the dine workspace
//!
//! Types used by dine-server and its clients: error codes and the unified
//! response envelope, order/payment/reconciliation models, kitchen display
//! messages and time helpers.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{KitchenMessage, KitchenUpdate};

//! 实时消息类型定义
//!
//! These types are shared between dine-server and the kitchen displays that
//! connect to its live-update channel.

pub mod kitchen;

pub use kitchen::{KitchenEventKind, KitchenMessage, KitchenUpdate};

//! 厨房显示实时推送
//!
//! - [`KitchenNotifier`] - 订阅者集合 + 有界队列 + 单一 dispatch 任务

pub mod notifier;

pub use notifier::{KitchenNotifier, SubscriberId};

//! Fixtures shared by unit tests

use rust_decimal::Decimal;
use shared::models::{CreateOrderRequest, OrderItemInput, OrderType};
use std::sync::Arc;

use crate::auth::{CurrentUser, Role};
use crate::catalog::{CatalogEntry, MemoryCatalog};
use crate::db::Storage;
use crate::kitchen::KitchenNotifier;
use crate::orders::OrderService;

pub const NASI_GORENG: i64 = 1;
pub const ES_TEH: i64 = 2;
pub const SATE: i64 = 3;
pub const SOLD_OUT: i64 = 4;

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn menu() -> MemoryCatalog {
    let entry = |id, name: &str, cents, available| CatalogEntry {
        id,
        name: name.to_string(),
        price: money(cents),
        available,
    };
    MemoryCatalog::with_entries([
        entry(NASI_GORENG, "Nasi Goreng", 1000, true),
        entry(ES_TEH, "Es Teh", 500, true),
        entry(SATE, "Sate Ayam", 899, true),
        entry(SOLD_OUT, "Rendang", 2500, false),
    ])
}

pub fn customer() -> CurrentUser {
    CurrentUser::new(10, "Dewi", Role::Customer)
}

pub fn cashier() -> CurrentUser {
    CurrentUser::new(20, "Rina", Role::Cashier)
}

pub fn staff() -> CurrentUser {
    CurrentUser::new(30, "Budi", Role::Staff)
}

pub fn line(menu_item_id: i64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        menu_item_id,
        quantity,
        special_requests: None,
    }
}

/// Dine-in at table 4: 10.00 × 2 + 5.00 × 1 → total 27.50
pub fn dine_in_request() -> CreateOrderRequest {
    CreateOrderRequest {
        order_type: OrderType::DineIn,
        table_id: Some(4),
        customer_name: None,
        customer_phone: None,
        notes: None,
        estimated_ready_at: None,
        items: vec![line(NASI_GORENG, 2), line(ES_TEH, 1)],
    }
}

pub fn takeaway_request() -> CreateOrderRequest {
    CreateOrderRequest {
        order_type: OrderType::Takeaway,
        table_id: None,
        customer_name: Some("Andi".into()),
        customer_phone: Some("08123456789".into()),
        notes: None,
        estimated_ready_at: None,
        items: vec![line(SATE, 1)],
    }
}

pub struct Fixture {
    pub storage: Storage,
    pub catalog: Arc<MemoryCatalog>,
    pub kitchen: KitchenNotifier,
    pub orders: OrderService,
}

/// In-memory storage, seeded menu, notifier without a running dispatcher
pub fn fixture() -> Fixture {
    let storage = Storage::open_in_memory().unwrap();
    let catalog = Arc::new(menu());
    let kitchen = KitchenNotifier::new(storage.clone(), 64);
    let orders = OrderService::new(storage.clone(), catalog.clone(), kitchen.clone());
    Fixture {
        storage,
        catalog,
        kitchen,
        orders,
    }
}

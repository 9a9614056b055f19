//! Order aggregate
//!
//! Every read-validate-write runs inside one redb write transaction, so two
//! racing transitions on the same order are serialized and the loser
//! validates against the winner's committed status.
//!
//! Catalog lookups happen before the write transaction is opened; a
//! transaction is never held across an `.await`.

use redb::WriteTransaction;
use shared::message::{KitchenEventKind, KitchenMessage};
use shared::models::{
    CreateOrderRequest, Order, OrderAmendment, OrderFilter, OrderItem, OrderItemInput,
    OrderStatus, OrderType,
};
use shared::util::{minutes_millis, now_millis};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::error::{OrderError, OrderResult};
use super::money::{OrderTotals, line_total, order_totals};
use crate::auth::CurrentUser;
use crate::catalog::CatalogLookup;
use crate::db::{ORDER_SEQ, Storage};
use crate::kitchen::KitchenNotifier;
use crate::utils::validation::{
    MAX_ITEMS_PER_ORDER, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_QUANTITY, MAX_SHORT_TEXT_LEN, non_blank,
    validate_optional_text,
};

/// Default pickup estimate for takeaway orders
pub const TAKEAWAY_READY_MINUTES: i64 = 30;

/// Parse a status string from a request body
pub fn parse_status(raw: &str) -> OrderResult<OrderStatus> {
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| OrderError::Validation(format!("Invalid order status: {raw}")))
}

fn validate_text(value: &Option<String>, field: &str, max_len: usize) -> OrderResult<()> {
    validate_optional_text(value, field, max_len).map_err(OrderError::Validation)
}

fn trimmed(value: &Option<String>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

#[derive(Clone)]
pub struct OrderService {
    storage: Storage,
    catalog: Arc<dyn CatalogLookup>,
    kitchen: KitchenNotifier,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(storage: Storage, catalog: Arc<dyn CatalogLookup>, kitchen: KitchenNotifier) -> Self {
        Self {
            storage,
            catalog,
            kitchen,
        }
    }

    pub fn kitchen(&self) -> &KitchenNotifier {
        &self.kitchen
    }

    // ========== Commands ==========

    /// Create a pending order priced from the catalog
    ///
    /// Cashier-entered orders (cashier/admin role) record the cashier name and
    /// require a customer name. No kitchen event is sent: pending orders are
    /// not on the kitchen display.
    pub async fn create(&self, initiator: &CurrentUser, req: CreateOrderRequest) -> OrderResult<Order> {
        let customer_name = trimmed(&req.customer_name);
        let customer_phone = trimmed(&req.customer_phone);
        let notes = trimmed(&req.notes);
        validate_text(&customer_name, "customer_name", MAX_NAME_LEN)?;
        validate_text(&customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
        validate_text(&notes, "notes", MAX_NOTE_LEN)?;

        let now = now_millis();
        let (table_id, estimated_ready_at) = match req.order_type {
            OrderType::DineIn => {
                let table_id = req.table_id.ok_or_else(|| {
                    OrderError::Validation("table_id is required for dine-in orders".into())
                })?;
                (Some(table_id), None)
            }
            OrderType::Takeaway => {
                if req.table_id.is_some() {
                    return Err(OrderError::Validation(
                        "takeaway orders must not reference a table".into(),
                    ));
                }
                if customer_phone.is_none() {
                    return Err(OrderError::Validation(
                        "customer_phone is required for takeaway orders".into(),
                    ));
                }
                let ready = req
                    .estimated_ready_at
                    .unwrap_or(now + minutes_millis(TAKEAWAY_READY_MINUTES));
                (None, Some(ready))
            }
        };

        let cashier_name = if initiator.is_cashier() {
            if customer_name.is_none() {
                return Err(OrderError::Validation(
                    "customer_name is required for cashier orders".into(),
                ));
            }
            Some(if initiator.name.is_empty() {
                format!("cashier #{}", initiator.id)
            } else {
                initiator.name.clone()
            })
        } else {
            None
        };

        let items = self.price_lines(&req.items).await?;
        let totals = totals_of(&items)?;

        let txn = self.storage.begin_write()?;
        let id = self.storage.next_id(&txn, ORDER_SEQ)?;
        let order = Order {
            id,
            user_id: initiator.id,
            table_id,
            order_type: req.order_type,
            status: OrderStatus::Pending,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            customer_name,
            customer_phone,
            cashier_name,
            notes,
            items,
            estimated_ready_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(
            order_id = order.id,
            user_id = order.user_id,
            order_type = %order.order_type,
            lines = order.items.len(),
            total = %order.total,
            "Order created"
        );
        Ok(order)
    }

    /// Move an order along the status table and notify the kitchen
    pub fn update_status(&self, order_id: i64, target: OrderStatus) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let order = self.transition_in_txn(&txn, order_id, target)?;
        txn.commit()?;

        self.kitchen.notify_order(&order);
        Ok(order)
    }

    /// Validate and apply a transition inside the caller's transaction
    ///
    /// Shared with the payment processor so a cash payment and its order
    /// advance commit together. Does not broadcast; the caller does that
    /// after commit.
    pub(crate) fn transition_in_txn(
        &self,
        txn: &WriteTransaction,
        order_id: i64,
        target: OrderStatus,
    ) -> OrderResult<Order> {
        let mut order = self.load_live(txn, order_id)?;
        let from = order.status;
        if !from.can_transition_to(target) {
            return Err(OrderError::InvalidTransition { from, to: target });
        }

        order.status = target;
        order.updated_at = now_millis();
        self.storage.put_order(txn, &order)?;

        tracing::info!(order_id, from = %from, to = %target, "Order status changed");
        Ok(order)
    }

    /// Replace the lines of a pending order, re-pricing from the catalog
    pub async fn update_items(&self, order_id: i64, inputs: Vec<OrderItemInput>) -> OrderResult<Order> {
        // Fail fast before calling the catalog
        let current = self.get(order_id)?;
        ensure_pending(&current, "items can only change while the order is pending")?;

        let items = self.price_lines(&inputs).await?;
        let totals = totals_of(&items)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_live(&txn, order_id)?;
        ensure_pending(&order, "items can only change while the order is pending")?;
        order.items = items;
        order.subtotal = totals.subtotal;
        order.tax = totals.tax;
        order.total = totals.total;
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(order_id, lines = order.items.len(), total = %order.total, "Order items updated");
        Ok(order)
    }

    /// Apply one tagged amendment
    pub async fn amend(&self, order_id: i64, amendment: OrderAmendment) -> OrderResult<Order> {
        match amendment {
            OrderAmendment::Status { status } => self.update_status(order_id, status),
            OrderAmendment::Items { items } => self.update_items(order_id, items).await,
            OrderAmendment::Notes { notes } => self.update_notes(order_id, notes),
            OrderAmendment::Customer {
                customer_name,
                customer_phone,
            } => self.update_customer(order_id, customer_name, customer_phone),
        }
    }

    fn update_notes(&self, order_id: i64, notes: Option<String>) -> OrderResult<Order> {
        let notes = trimmed(&notes);
        validate_text(&notes, "notes", MAX_NOTE_LEN)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_live(&txn, order_id)?;
        if order.status.is_terminal() {
            return Err(OrderError::InvalidState {
                order_id,
                status: order.status,
                reason: "notes cannot change on a finished order".into(),
            });
        }
        order.notes = notes;
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(order_id, "Order notes updated");
        if order.status.is_kitchen_active() {
            self.kitchen
                .broadcast(KitchenMessage::with_kind(KitchenEventKind::StatusUpdate, order.clone()));
        }
        Ok(order)
    }

    /// `None` leaves a field unchanged, a blank string clears it
    fn update_customer(
        &self,
        order_id: i64,
        customer_name: Option<String>,
        customer_phone: Option<String>,
    ) -> OrderResult<Order> {
        validate_text(&customer_name, "customer_name", MAX_NAME_LEN)?;
        validate_text(&customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;

        let txn = self.storage.begin_write()?;
        let mut order = self.load_live(&txn, order_id)?;
        ensure_pending(&order, "customer details can only change while the order is pending")?;

        if customer_name.is_some() {
            order.customer_name = trimmed(&customer_name);
        }
        if customer_phone.is_some() {
            order.customer_phone = trimmed(&customer_phone);
        }
        if order.order_type == OrderType::Takeaway && order.customer_phone.is_none() {
            return Err(OrderError::Validation(
                "customer_phone is required for takeaway orders".into(),
            ));
        }
        if order.cashier_name.is_some() && order.customer_name.is_none() {
            return Err(OrderError::Validation(
                "customer_name is required for cashier orders".into(),
            ));
        }

        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(order_id, "Order customer details updated");
        Ok(order)
    }

    /// Stamp `deleted_at`; a deleted order drops off the kitchen display
    pub fn soft_delete(&self, order_id: i64) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_live(&txn, order_id)?;
        let was_on_display = order.status.is_kitchen_active();
        let now = now_millis();
        order.deleted_at = Some(now);
        order.updated_at = now;
        self.storage.put_order(&txn, &order)?;
        txn.commit()?;

        tracing::info!(order_id, status = %order.status, "Order soft-deleted");
        if was_on_display {
            self.kitchen
                .broadcast(KitchenMessage::with_kind(KitchenEventKind::OrderCancelled, order.clone()));
        }
        Ok(order)
    }

    /// Re-send the current state of one order to every kitchen display
    ///
    /// Returns the order and whether the event was queued.
    pub fn rebroadcast(&self, order_id: i64, kind: Option<KitchenEventKind>) -> OrderResult<(Order, bool)> {
        let order = self.get(order_id)?;
        let message = match kind {
            Some(kind) => KitchenMessage::with_kind(kind, order.clone()),
            None => KitchenMessage::for_order(order.clone()),
        };
        let queued = self.kitchen.broadcast(message);
        Ok((order, queued))
    }

    // ========== Queries ==========

    /// Soft-deleted orders are reported as not found
    pub fn get(&self, order_id: i64) -> OrderResult<Order> {
        self.storage
            .get_order(order_id)?
            .filter(|order| !order.is_deleted())
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Live orders matching `filter`, newest first
    pub fn list(&self, filter: &OrderFilter) -> OrderResult<Vec<Order>> {
        self.list_where(|order| filter.matches(order))
    }

    pub fn list_by_user(&self, user_id: i64) -> OrderResult<Vec<Order>> {
        self.list_where(|order| order.user_id == user_id)
    }

    /// Takeaway orders waiting for pickup
    pub fn ready_takeaway(&self) -> OrderResult<Vec<Order>> {
        self.list_where(|order| {
            order.order_type == OrderType::Takeaway && order.status == OrderStatus::Ready
        })
    }

    pub fn kitchen_orders(&self) -> OrderResult<Vec<Order>> {
        Ok(self.storage.kitchen_orders()?)
    }

    // ========== Internals ==========

    fn list_where(&self, predicate: impl Fn(&Order) -> bool) -> OrderResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .storage
            .list_orders()?
            .into_iter()
            .filter(|order| !order.is_deleted() && predicate(order))
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    fn load_live(&self, txn: &WriteTransaction, order_id: i64) -> OrderResult<Order> {
        self.storage
            .get_order_txn(txn, order_id)?
            .filter(|order| !order.is_deleted())
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Validate inputs and freeze catalog prices onto new lines
    async fn price_lines(&self, inputs: &[OrderItemInput]) -> OrderResult<Vec<OrderItem>> {
        if inputs.is_empty() {
            return Err(OrderError::Validation("order must contain at least one item".into()));
        }
        if inputs.len() > MAX_ITEMS_PER_ORDER {
            return Err(OrderError::Validation(format!(
                "too many items ({}, max {MAX_ITEMS_PER_ORDER})",
                inputs.len()
            )));
        }
        for input in inputs {
            if !(1..=MAX_QUANTITY).contains(&input.quantity) {
                return Err(OrderError::Validation(format!(
                    "quantity for menu item {} must be between 1 and {MAX_QUANTITY}, got {}",
                    input.menu_item_id, input.quantity
                )));
            }
            validate_text(&input.special_requests, "special_requests", MAX_NOTE_LEN)?;
        }

        let ids: Vec<i64> = inputs
            .iter()
            .map(|input| input.menu_item_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let entries = self.catalog.lookup(&ids).await?;

        let mut lines = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let entry = entries
                .get(&input.menu_item_id)
                .ok_or(OrderError::MenuItemNotFound(input.menu_item_id))?;
            if !entry.available {
                return Err(OrderError::MenuItemUnavailable {
                    menu_item_id: input.menu_item_id,
                    name: entry.name.clone(),
                });
            }
            let total = line_total(entry.price, input.quantity).ok_or_else(|| {
                OrderError::AmountOverflow(format!(
                    "{} x {}",
                    entry.price, input.quantity
                ))
            })?;
            lines.push(OrderItem {
                line_no: index as u32 + 1,
                menu_item_id: input.menu_item_id,
                name: entry.name.clone(),
                quantity: input.quantity,
                unit_price: entry.price,
                line_total: total,
                special_requests: trimmed(&input.special_requests),
            });
        }
        Ok(lines)
    }
}

fn totals_of(items: &[OrderItem]) -> OrderResult<OrderTotals> {
    order_totals(items.iter().map(|item| item.line_total))
        .ok_or_else(|| OrderError::AmountOverflow("order total".into()))
}

fn ensure_pending(order: &Order, reason: &str) -> OrderResult<()> {
    if order.status == OrderStatus::Pending {
        Ok(())
    } else {
        Err(OrderError::InvalidState {
            order_id: order.id,
            status: order.status,
            reason: reason.to_string(),
        })
    }
}

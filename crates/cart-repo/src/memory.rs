use async_trait::async_trait;
use cart_types::domain::cart::{CartItemPatch, CartLineItem, NewCartItem};
use cart_types::domain::order::{Order, OrderPayload};
use cart_types::ports::cart_api::{ApiError, CartApi};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
struct StoredLine {
    seq: u64,
    item: CartLineItem,
}

/// Cart backend kept entirely in process memory.
#[derive(Clone)]
pub struct InMemoryCartApi {
    lines: Arc<DashMap<Uuid, StoredLine>>,
    orders: Arc<DashMap<Uuid, Order>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryCartApi {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Orders placed by `user_id`, oldest first.
    pub fn orders_for(&self, user_id: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| kv.value().user_id == user_id)
            .map(|kv| kv.value().clone())
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Default for InMemoryCartApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartApi for InMemoryCartApi {
    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartLineItem>, ApiError> {
        let mut rows: Vec<StoredLine> = self
            .lines
            .iter()
            .filter(|kv| kv.value().item.user_id == user_id)
            .map(|kv| kv.value().clone())
            .collect();
        rows.sort_by_key(|r| r.seq);
        Ok(rows.into_iter().map(|r| r.item).collect())
    }

    async fn find_cart_item_by_menu_id(
        &self,
        menu_item_id: &str,
        user_id: &str,
    ) -> Result<Option<CartLineItem>, ApiError> {
        Ok(self
            .lines
            .iter()
            .filter(|kv| {
                let it = &kv.value().item;
                it.user_id == user_id && it.menu_item_id == menu_item_id
            })
            .min_by_key(|kv| kv.value().seq)
            .map(|kv| kv.value().item.clone()))
    }

    async fn add_cart_item(&self, item: NewCartItem) -> Result<CartLineItem, ApiError> {
        item.validate()
            .map_err(|e| ApiError::Rejected(e.to_string()))?;
        let line = item.into_line(Uuid::new_v4());
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.lines.insert(
            line.id,
            StoredLine {
                seq,
                item: line.clone(),
            },
        );
        tracing::debug!(id = %line.id, user_id = %line.user_id, "cart line created");
        Ok(line)
    }

    async fn update_cart_item(
        &self,
        id: Uuid,
        patch: CartItemPatch,
    ) -> Result<CartLineItem, ApiError> {
        if patch.quantity == Some(0) {
            return Err(ApiError::Rejected("quantity must be > 0".into()));
        }
        let Some(mut row) = self.lines.get_mut(&id) else {
            return Err(ApiError::NotFound(format!("cart item {id}")));
        };
        if let Some(qty) = patch.quantity {
            row.item.quantity = qty;
        }
        Ok(row.item.clone())
    }

    async fn remove_cart_item(&self, id: Uuid) -> Result<(), ApiError> {
        match self.lines.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound(format!("cart item {id}"))),
        }
    }

    async fn create_order(&self, payload: OrderPayload) -> Result<Order, ApiError> {
        if payload.items.is_empty() {
            return Err(ApiError::Rejected("items empty".into()));
        }
        let order = Order::from_payload(Uuid::new_v4(), payload);
        self.orders.insert(order.id, order.clone());
        tracing::debug!(id = %order.id, total_cents = order.total_cents, "order created");
        Ok(order)
    }
}

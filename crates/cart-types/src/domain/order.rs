use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::{CartLineItem, MenuItemId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

impl From<&CartLineItem> for OrderLine {
    fn from(it: &CartLineItem) -> Self {
        Self {
            menu_item_id: it.menu_item_id.clone(),
            name: it.name.clone(),
            price_cents: it.price_cents,
            quantity: it.quantity,
        }
    }
}

/// Snapshot of a cart submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderPayload {
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderPayload {
    pub fn from_cart(user_id: &str, items: &[CartLineItem]) -> anyhow::Result<Self> {
        if user_id.trim().is_empty() {
            anyhow::bail!("user_id empty");
        }
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        if items.iter().any(|it| it.quantity == 0) {
            anyhow::bail!("item quantity must be > 0");
        }
        let lines: Vec<OrderLine> = items.iter().map(OrderLine::from).collect();
        let total = lines
            .iter()
            .try_fold(0i64, |acc, it| {
                it.price_cents
                    .checked_mul(i64::from(it.quantity))
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(|| anyhow::anyhow!("order total overflows"))?;
        Ok(Self {
            user_id: user_id.to_string(),
            items: lines,
            total_cents: total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

/// An order as recorded by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn from_payload(id: Uuid, payload: OrderPayload) -> Self {
        Self {
            id,
            user_id: payload.user_id,
            items: payload.items,
            total_cents: payload.total_cents,
            status: payload.status,
            created_at: payload.created_at,
        }
    }
}

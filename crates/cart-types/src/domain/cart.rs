use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = String;
pub type MenuItemId = String;

/// A menu entry the shopper wants to put in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price_cents: i64,
}

/// One line of a user's cart as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLineItem {
    pub id: Uuid,
    pub user_id: UserId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

impl CartLineItem {
    /// Saturates at `i64::MAX`.
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents.saturating_mul(i64::from(self.quantity))
    }
}

/// Creation payload for a cart line; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

impl NewCartItem {
    /// A fresh line for `item` with quantity 1.
    pub fn from_menu_item(user_id: &str, item: &MenuItem) -> Self {
        Self {
            user_id: user_id.to_string(),
            menu_item_id: item.id.clone(),
            name: item.name.clone(),
            price_cents: item.price_cents,
            quantity: 1,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.user_id.trim().is_empty() {
            anyhow::bail!("user_id empty");
        }
        if self.menu_item_id.trim().is_empty() {
            anyhow::bail!("menu_item_id empty");
        }
        if self.price_cents < 0 {
            anyhow::bail!("price must be >= 0");
        }
        if self.quantity == 0 {
            anyhow::bail!("quantity must be > 0");
        }
        Ok(())
    }

    pub fn into_line(self, id: Uuid) -> CartLineItem {
        CartLineItem {
            id,
            user_id: self.user_id,
            menu_item_id: self.menu_item_id,
            name: self.name,
            price_cents: self.price_cents,
            quantity: self.quantity,
        }
    }
}

/// Partial update of a cart line. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl CartItemPatch {
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Cached view of the active user's cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartState {
    pub user_id: Option<UserId>,
    pub items: Vec<CartLineItem>,
    pub phase: SessionPhase,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl CartState {
    pub fn cart_count(&self) -> u64 {
        self.items.iter().map(|it| u64::from(it.quantity)).sum()
    }

    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .map(CartLineItem::line_total_cents)
            .fold(0i64, i64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, menu_item_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|it| it.menu_item_id == menu_item_id)
            .map(|it| it.quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(menu_item_id: &str, price_cents: i64, quantity: u32) -> CartLineItem {
        CartLineItem {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            menu_item_id: menu_item_id.into(),
            name: menu_item_id.to_uppercase(),
            price_cents,
            quantity,
        }
    }

    #[test]
    fn derived_totals_follow_items() {
        let mut state = CartState::default();
        assert_eq!(state.cart_count(), 0);
        assert_eq!(state.total_cents(), 0);

        state.items = vec![line("m1", 1000, 2), line("m2", 250, 3)];
        assert_eq!(state.cart_count(), 5);
        assert_eq!(state.total_cents(), 2750);
        assert_eq!(state.quantity_of("m2"), 3);
        assert_eq!(state.quantity_of("nope"), 0);
    }

    #[test]
    fn huge_totals_saturate() {
        let state = CartState {
            items: vec![line("m1", i64::MAX / 2, u32::MAX), line("m2", 1, 1)],
            ..CartState::default()
        };
        assert_eq!(state.items[0].line_total_cents(), i64::MAX);
        assert_eq!(state.total_cents(), i64::MAX);
    }

    #[test]
    fn new_item_from_menu_starts_at_one() {
        let burger = MenuItem {
            id: "m1".into(),
            name: "Burger".into(),
            price_cents: 1000,
        };
        let new_item = NewCartItem::from_menu_item("u1", &burger);
        assert_eq!(new_item.quantity, 1);
        assert!(new_item.validate().is_ok());

        let id = Uuid::new_v4();
        let stored = new_item.into_line(id);
        assert_eq!(stored.id, id);
        assert_eq!(stored.line_total_cents(), 1000);
    }

    #[test]
    fn validation_errors() {
        let base = NewCartItem {
            user_id: "u1".into(),
            menu_item_id: "m1".into(),
            name: "Burger".into(),
            price_cents: 1000,
            quantity: 1,
        };

        let no_user = NewCartItem {
            user_id: " ".into(),
            ..base.clone()
        };
        assert!(no_user.validate().is_err());

        let negative = NewCartItem {
            price_cents: -1,
            ..base.clone()
        };
        assert!(negative.validate().is_err());

        let zero_qty = NewCartItem {
            quantity: 0,
            ..base
        };
        assert!(zero_qty.validate().is_err());
    }

    #[test]
    fn empty_patch_serializes_without_fields() {
        let body = serde_json::to_value(CartItemPatch::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));
        let body = serde_json::to_value(CartItemPatch::quantity(4)).unwrap();
        assert_eq!(body, serde_json::json!({ "quantity": 4 }));
    }
}

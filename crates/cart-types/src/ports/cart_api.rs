use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cart::{CartItemPatch, CartLineItem, NewCartItem};
use crate::domain::order::{Order, OrderPayload};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Remote cart backend. Every call may fail with an [`ApiError`].
#[async_trait]
pub trait CartApi: Send + Sync + 'static {
    /// Lines of `user_id`'s cart in the order the backend created them.
    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartLineItem>, ApiError>;
    async fn find_cart_item_by_menu_id(
        &self,
        menu_item_id: &str,
        user_id: &str,
    ) -> Result<Option<CartLineItem>, ApiError>;
    async fn add_cart_item(&self, item: NewCartItem) -> Result<CartLineItem, ApiError>;
    async fn update_cart_item(
        &self,
        id: Uuid,
        patch: CartItemPatch,
    ) -> Result<CartLineItem, ApiError>;
    async fn remove_cart_item(&self, id: Uuid) -> Result<(), ApiError>;
    async fn create_order(&self, payload: OrderPayload) -> Result<Order, ApiError>;
}

use std::sync::atomic::{AtomicU64, Ordering};

use cart_types::domain::cart::{
    CartItemPatch, CartLineItem, CartState, MenuItem, NewCartItem, SessionPhase, UserId,
};
use cart_types::domain::order::{Order, OrderPayload};
use cart_types::ports::cart_api::{ApiError, CartApi};
use cart_types::ports::identity::{Identity, IdentityProvider};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::CartError;

/// Client-side cache of the active user's cart.
pub struct CartStore<A: CartApi> {
    api: A,
    state: watch::Sender<CartState>,
    generation: AtomicU64,
    ops: Mutex<()>,
}

impl<A: CartApi> CartStore<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            api,
            state,
            generation: AtomicU64::new(0),
            ops: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<CartLineItem> {
        self.state.borrow().items.clone()
    }

    pub fn cart_count(&self) -> u64 {
        self.state.borrow().cart_count()
    }

    pub fn total_cents(&self) -> i64 {
        self.state.borrow().total_cents()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state.borrow().user_id.clone()
    }

    pub fn quantity_of(&self, menu_item_id: &str) -> u32 {
        self.state.borrow().quantity_of(menu_item_id)
    }

    pub fn dismiss_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    pub async fn sync_identity(&self, identity: &Identity) {
        if !identity.resolved {
            debug!("identity not resolved yet; cart load deferred");
            return;
        }
        let (current, phase) = {
            let s = self.state.borrow();
            (s.user_id.clone(), s.phase)
        };
        if phase != SessionPhase::Uninitialized && current == identity.user_id {
            return;
        }
        self.load(identity.user_id.clone()).await;
    }

    pub async fn sync_from(&self, provider: &impl IdentityProvider) {
        self.sync_identity(&provider.current()).await;
    }

    /// Fetch failures empty the cart.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: Option<UserId>) {
        let Some(user_id) = user_id else {
            self.state.send_modify(|s| {
                self.generation.fetch_add(1, Ordering::SeqCst);
                *s = CartState {
                    phase: SessionPhase::Ready,
                    ..CartState::default()
                };
            });
            debug!("no active user; cart emptied");
            return;
        };

        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if s.user_id.as_deref() != Some(user_id.as_str()) {
                s.items.clear();
                s.error = None;
            }
            s.user_id = Some(user_id.clone());
            s.phase = SessionPhase::Loading;
            s.is_loading = true;
        });

        let result = self.api.fetch_cart(&user_id).await;
        self.apply_fetch(generation, result, true);
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let mut started = None;
        self.state.send_if_modified(|s| {
            let Some(user_id) = s.user_id.clone() else {
                return false;
            };
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            started = Some((user_id, generation));
            s.phase = SessionPhase::Loading;
            s.is_loading = true;
            true
        });
        let Some((user_id, generation)) = started else {
            return;
        };

        let result = self.api.fetch_cart(&user_id).await;
        self.apply_fetch(generation, result, false);
    }

    fn apply_fetch(
        &self,
        generation: u64,
        result: Result<Vec<CartLineItem>, ApiError>,
        empty_on_failure: bool,
    ) {
        let applied = self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.phase = SessionPhase::Ready;
            s.is_loading = false;
            match result {
                Ok(items) => {
                    s.items = items;
                    s.error = None;
                }
                Err(e) => {
                    warn!(error = %e, "cart fetch failed");
                    if empty_on_failure {
                        s.items.clear();
                    }
                    s.error = Some(e.to_string());
                }
            }
            true
        });
        if !applied {
            debug!(generation, "discarding superseded cart response");
        }
    }

    fn record_error(&self, err: &CartError) {
        let msg = err.to_string();
        self.state.send_modify(|s| s.error = Some(msg));
    }

    // Refetch after a mutation, unless the session has moved to another user
    // meanwhile; that user's load owns the state now.
    async fn resync(&self, user_id: Option<&str>) {
        let current = self.active_user();
        if user_id.is_some() && current.as_deref() != user_id {
            debug!("session changed during mutation; skipping refetch");
            return;
        }
        self.refresh().await;
    }

    fn active_user(&self) -> Option<UserId> {
        self.state
            .borrow()
            .user_id
            .clone()
            .filter(|u| !u.trim().is_empty())
    }

    #[instrument(skip(self, item), fields(menu_item_id = %item.id))]
    pub async fn add_to_cart(&self, item: &MenuItem) -> Result<(), CartError> {
        let _op = self.ops.lock().await;
        let result = self.add_locked(item).await;
        if let Err(e) = &result {
            error!(error = %e, "add to cart failed");
            self.record_error(e);
        }
        result
    }

    async fn add_locked(&self, item: &MenuItem) -> Result<(), CartError> {
        let user_id = self.active_user().ok_or(CartError::Unauthenticated)?;
        match self
            .api
            .find_cart_item_by_menu_id(&item.id, &user_id)
            .await?
        {
            Some(existing) => {
                let quantity = existing.quantity.saturating_add(1);
                self.api
                    .update_cart_item(existing.id, CartItemPatch::quantity(quantity))
                    .await?;
            }
            None => {
                self.api
                    .add_cart_item(NewCartItem::from_menu_item(&user_id, item))
                    .await?;
            }
        }
        self.resync(Some(&user_id)).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, id: Uuid) {
        let _op = self.ops.lock().await;
        if let Err(e) = self.remove_locked(id).await {
            warn!(error = %e, "remove from cart failed");
            self.record_error(&e);
        }
    }

    async fn remove_locked(&self, id: Uuid) -> Result<(), CartError> {
        let user_id = self.active_user();
        self.api.remove_cart_item(id).await?;
        self.resync(user_id.as_deref()).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, id: Uuid, quantity: i64) {
        let _op = self.ops.lock().await;
        if let Err(e) = self.update_locked(id, quantity).await {
            warn!(error = %e, "quantity update failed");
            self.record_error(&e);
        }
    }

    async fn update_locked(&self, id: Uuid, quantity: i64) -> Result<(), CartError> {
        let clamped = quantity.max(0);
        if clamped == 0 {
            return self.remove_locked(id).await;
        }
        let quantity =
            u32::try_from(clamped).map_err(|_| CartError::InvalidQuantity(clamped))?;
        let user_id = self.active_user();
        self.api
            .update_cart_item(id, CartItemPatch::quantity(quantity))
            .await?;
        self.resync(user_id.as_deref()).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        let _op = self.ops.lock().await;
        let Some(user_id) = self.active_user() else {
            return;
        };
        if let Err(e) = self.clear_locked(&user_id).await {
            warn!(error = %e, "clear cart failed");
            self.record_error(&e);
        }
    }

    // Deletes line by line; a failed delete does not stop the rest.
    async fn clear_locked(&self, user_id: &str) -> Result<(), CartError> {
        let items = self.api.fetch_cart(user_id).await?;
        let total = items.len();
        let mut failures = Vec::new();
        for item in items {
            if let Err(e) = self.api.remove_cart_item(item.id).await {
                warn!(id = %item.id, error = %e, "cart line delete failed");
                failures.push(e);
            }
        }
        self.resync(Some(user_id)).await;

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(CartError::PartialClear {
                failed,
                total,
                first,
            }),
        }
    }

    /// On failure the cart is left as it was.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<Order, CartError> {
        let _op = self.ops.lock().await;
        let result = self.checkout_locked().await;
        if let Err(e) = &result {
            error!(error = %e, "checkout failed");
            self.record_error(e);
        }
        result
    }

    async fn checkout_locked(&self) -> Result<Order, CartError> {
        let (user_id, items) = {
            let s = self.state.borrow();
            (
                s.user_id.clone().filter(|u| !u.trim().is_empty()),
                s.items.clone(),
            )
        };
        let user_id = user_id.ok_or(CartError::Unauthenticated)?;
        if items.is_empty() {
            return Err(CartError::EmptyCart);
        }
        let payload = OrderPayload::from_cart(&user_id, &items)
            .map_err(|e| CartError::InvalidOrder(e.to_string()))?;
        let order = self.api.create_order(payload).await?;
        info!(order_id = %order.id, total_cents = order.total_cents, "order placed");

        if let Err(e) = self.clear_locked(&user_id).await {
            warn!(error = %e, "order placed but cart clear failed");
            self.record_error(&e);
        }
        Ok(order)
    }
}

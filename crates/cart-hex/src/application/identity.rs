use std::sync::Arc;

use cart_types::domain::cart::UserId;
use cart_types::ports::cart_api::CartApi;
use cart_types::ports::identity::{Identity, IdentityProvider};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::cart_store::CartStore;

/// Identity source fed by the sign-in layer and observed by cart stores.
#[derive(Clone)]
pub struct WatchIdentity {
    tx: Arc<watch::Sender<Identity>>,
}

impl WatchIdentity {
    pub fn new(initial: Identity) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, identity: Identity) {
        self.tx.send_replace(identity);
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>) {
        self.set(Identity::signed_in(user_id));
    }

    pub fn sign_out(&self) {
        self.set(Identity::anonymous());
    }

    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.tx.subscribe()
    }
}

impl Default for WatchIdentity {
    fn default() -> Self {
        Self::new(Identity::pending())
    }
}

impl IdentityProvider for WatchIdentity {
    fn current(&self) -> Identity {
        self.tx.borrow().clone()
    }
}

/// Keeps `store` on the current user's cart: syncs once for the initial
/// identity, then on every change. Ends when every sender is dropped.
pub fn spawn_identity_sync<A: CartApi>(
    store: Arc<CartStore<A>>,
    mut rx: watch::Receiver<Identity>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let identity = rx.borrow_and_update().clone();
            store.sync_identity(&identity).await;
            if rx.changed().await.is_err() {
                tracing::debug!("identity source closed; stopping cart sync");
                break;
            }
        }
    })
}

///  To run :
///  cargo r --example cart_demo
use std::sync::Arc;
use std::time::Duration;

use cart_client::CartClient;
use cart_hex::application::cart_store::CartStore;
use cart_hex::application::identity::{spawn_identity_sync, WatchIdentity};
use cart_hex::config::Config;
use cart_hex::inbound::http::{HttpServer, HttpServerConfig};
use cart_repo::build_backend;
use cart_types::domain::cart::{MenuItem, SessionPhase};

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    // Talk to CART_API_URL when set, otherwise start a backend on an ephemeral port.
    let config = Config::from_env()?;
    let (addr, server_handle) = if std::env::var("CART_API_URL").is_ok() {
        (config.cart_api_url.clone(), None)
    } else {
        let port = find_free_port();
        let server = HttpServer::new(
            build_backend(),
            HttpServerConfig {
                port: port.to_string(),
            },
        )
        .await?;
        let handle = tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!("server error: {e:?}");
            }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        (format!("http://127.0.0.1:{port}/"), Some(handle))
    };

    let mut client = CartClient::builder(&addr)?;
    if let Some(timeout) = config.cart_api_timeout {
        client = client.with_timeout(timeout);
    }
    let store = Arc::new(CartStore::new(client.build()?));

    let identity = WatchIdentity::default();
    let sync = spawn_identity_sync(store.clone(), identity.subscribe());
    let mut state = store.subscribe();

    identity.sign_in("demo-user");
    state
        .wait_for(|s| s.user_id.is_some() && s.phase == SessionPhase::Ready)
        .await?;
    println!("loaded cart: {} items", store.cart_count());

    let burger = MenuItem {
        id: "m1".into(),
        name: "Burger".into(),
        price_cents: 1000,
    };
    let fries = MenuItem {
        id: "m2".into(),
        name: "Fries".into(),
        price_cents: 350,
    };

    store.add_to_cart(&burger).await?;
    store.add_to_cart(&burger).await?;
    store.add_to_cart(&fries).await?;
    println!(
        "cart: {} items, total {} cents",
        store.cart_count(),
        store.total_cents()
    );

    let fries_line = store
        .items()
        .into_iter()
        .find(|it| it.menu_item_id == fries.id)
        .map(|it| it.id);
    if let Some(id) = fries_line {
        store.update_quantity(id, 3).await;
    }
    println!("after update: total {} cents", store.total_cents());

    let order = store.checkout().await?;
    println!(
        "order {} placed: {} cents, status {:?}",
        order.id, order.total_cents, order.status
    );
    println!("cart after checkout: {} items", store.cart_count());

    identity.sign_out();
    drop(identity);
    sync.await?;

    if let Some(handle) = server_handle {
        handle.abort();
    }
    Ok(())
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    serve, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::errors::AppError;
use cart_types::domain::cart::{CartItemPatch, CartLineItem, NewCartItem};
use cart_types::domain::order::{Order, OrderPayload};
use cart_types::ports::cart_api::CartApi;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Serves a [`CartApi`] backend over REST.
#[derive(Clone)]
pub struct HttpServer<R>
where
    R: CartApi,
{
    pub backend: Arc<R>,
    pub config: HttpServerConfig,
}

impl<R> HttpServer<R>
where
    R: CartApi,
{
    pub async fn new(backend: R, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            backend: Arc::new(backend),
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = router(self.backend.clone());
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting cart backend on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

pub fn router<R>(backend: Arc<R>) -> Router
where
    R: CartApi,
{
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            let request_id = Uuid::new_v4();
            tracing::info_span!(
                "http_request",
                %request_id,
                method = %request.method(),
                uri
            )
        })
        .on_response(
            |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                tracing::info!(
                    parent: span,
                    status = %response.status(),
                    latency_ms = %latency.as_millis(),
                    "response"
                );
            },
        );

    Router::new()
        .route("/health", get(health))
        .route("/users/{user_id}/cart", get(fetch_cart::<R>))
        .route(
            "/users/{user_id}/cart/menu-items/{menu_item_id}",
            get(find_by_menu_item::<R>),
        )
        .route("/cart/items", post(add_item::<R>))
        .route("/cart/items/{id}", patch(update_item::<R>))
        .route("/cart/items/{id}", delete(remove_item::<R>))
        .route("/orders", post(create_order::<R>))
        .layer(trace_layer)
        .with_state(backend)
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn fetch_cart<R>(
    State(backend): State<Arc<R>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CartLineItem>>, AppError>
where
    R: CartApi,
{
    let items = backend.fetch_cart(&user_id).await?;
    Ok(Json(items))
}

async fn find_by_menu_item<R>(
    State(backend): State<Arc<R>>,
    Path((user_id, menu_item_id)): Path<(String, String)>,
) -> Result<Json<CartLineItem>, AppError>
where
    R: CartApi,
{
    match backend
        .find_cart_item_by_menu_id(&menu_item_id, &user_id)
        .await?
    {
        Some(item) => Ok(Json(item)),
        None => Err(AppError::NotFound(format!(
            "menu item {menu_item_id} not in cart"
        ))),
    }
}

async fn add_item<R>(
    State(backend): State<Arc<R>>,
    Json(payload): Json<NewCartItem>,
) -> Result<(StatusCode, Json<CartLineItem>), AppError>
where
    R: CartApi,
{
    let item = backend.add_cart_item(payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item<R>(
    State(backend): State<Arc<R>>,
    Path(id): Path<String>,
    Json(patch): Json<CartItemPatch>,
) -> Result<Json<CartLineItem>, AppError>
where
    R: CartApi,
{
    let id = parse_id(&id)?;
    let item = backend.update_cart_item(id, patch).await?;
    Ok(Json(item))
}

async fn remove_item<R>(
    State(backend): State<Arc<R>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    R: CartApi,
{
    let id = parse_id(&id)?;
    backend.remove_cart_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_order<R>(
    State(backend): State<Arc<R>>,
    Json(payload): Json<OrderPayload>,
) -> Result<(StatusCode, Json<Order>), AppError>
where
    R: CartApi,
{
    let order = backend.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

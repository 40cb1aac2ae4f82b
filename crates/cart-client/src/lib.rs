use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cart_types::domain::cart::{CartItemPatch, CartLineItem, NewCartItem};
use cart_types::domain::order::{Order, OrderPayload};
use cart_types::ports::cart_api::{ApiError, CartApi};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone)]
pub struct CartClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

/// [`CartApi`] over the REST cart backend.
#[derive(Clone)]
pub struct CartClient {
    base: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

async fn check(res: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let msg = res
        .json::<ErrorBody>()
        .await
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());
    tracing::debug!(%status, %msg, "cart backend returned an error");
    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(msg),
        s if s.is_client_error() => ApiError::Rejected(msg),
        _ => ApiError::Transport(format!("{status}: {msg}")),
    })
}

impl CartClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<CartClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        if base.cannot_be_a_base() {
            anyhow::bail!("base url cannot carry a path: {base_url}");
        }
        Ok(CartClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn health(&self) -> Result<(), ApiError> {
        let res = self
            .client
            .get(self.url(&["health"])?)
            .send()
            .await
            .map_err(transport)?;
        check(res).await?;
        Ok(())
    }
}

#[async_trait]
impl CartApi for CartClient {
    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartLineItem>, ApiError> {
        let res = self
            .client
            .get(self.url(&["users", user_id, "cart"])?)
            .send()
            .await
            .map_err(transport)?;
        check(res).await?.json().await.map_err(transport)
    }

    async fn find_cart_item_by_menu_id(
        &self,
        menu_item_id: &str,
        user_id: &str,
    ) -> Result<Option<CartLineItem>, ApiError> {
        let res = self
            .client
            .get(self.url(&["users", user_id, "cart", "menu-items", menu_item_id])?)
            .send()
            .await
            .map_err(transport)?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check(res).await?.json().await.map_err(transport)
    }

    async fn add_cart_item(&self, item: NewCartItem) -> Result<CartLineItem, ApiError> {
        let res = self
            .client
            .post(self.url(&["cart", "items"])?)
            .json(&item)
            .send()
            .await
            .map_err(transport)?;
        check(res).await?.json().await.map_err(transport)
    }

    async fn update_cart_item(
        &self,
        id: Uuid,
        patch: CartItemPatch,
    ) -> Result<CartLineItem, ApiError> {
        let res = self
            .client
            .patch(self.url(&["cart", "items", &id.to_string()])?)
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        check(res).await?.json().await.map_err(transport)
    }

    async fn remove_cart_item(&self, id: Uuid) -> Result<(), ApiError> {
        let res = self
            .client
            .delete(self.url(&["cart", "items", &id.to_string()])?)
            .send()
            .await
            .map_err(transport)?;
        check(res).await?;
        Ok(())
    }

    async fn create_order(&self, payload: OrderPayload) -> Result<Order, ApiError> {
        let res = self
            .client
            .post(self.url(&["orders"])?)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        check(res).await?.json().await.map_err(transport)
    }
}

impl CartClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<CartClient> {
        if let Some(client) = self.client {
            return Ok(CartClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(CartClient {
            base: self.base,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_types::domain::order::OrderStatus;
    use httpmock::prelude::*;

    fn sample_line() -> CartLineItem {
        CartLineItem {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            menu_item_id: "m1".into(),
            name: "Burger".into(),
            price_cents: 1000,
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn fetch_and_find_cart_items() {
        let server = MockServer::start();
        let line = sample_line();

        let fetch_mock = server.mock(|when, then| {
            when.method(GET).path("/users/u1/cart");
            then.status(200).json_body_obj(&vec![line.clone()]);
        });
        let found_mock = server.mock(|when, then| {
            when.method(GET).path("/users/u1/cart/menu-items/m1");
            then.status(200).json_body_obj(&line);
        });
        let missing_mock = server.mock(|when, then| {
            when.method(GET).path("/users/u1/cart/menu-items/m2");
            then.status(404)
                .json_body(serde_json::json!({ "error": "not in cart" }));
        });

        let client = CartClient::new(&server.base_url()).unwrap();
        let cart = client.fetch_cart("u1").await.unwrap();
        assert_eq!(cart, vec![line.clone()]);

        let found = client.find_cart_item_by_menu_id("m1", "u1").await.unwrap();
        assert_eq!(found, Some(line));
        let missing = client.find_cart_item_by_menu_id("m2", "u1").await.unwrap();
        assert!(missing.is_none());

        fetch_mock.assert();
        found_mock.assert();
        missing_mock.assert();
    }

    #[tokio::test]
    async fn add_update_remove() {
        let server = MockServer::start();
        let line = sample_line();
        let new_item = NewCartItem {
            user_id: line.user_id.clone(),
            menu_item_id: line.menu_item_id.clone(),
            name: line.name.clone(),
            price_cents: line.price_cents,
            quantity: 1,
        };

        let add_mock = server.mock(|when, then| {
            when.method(POST).path("/cart/items").json_body_obj(&new_item);
            then.status(201).json_body_obj(&line);
        });
        let update_mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path(format!("/cart/items/{}", line.id))
                .json_body(serde_json::json!({ "quantity": 2 }));
            let mut updated = line.clone();
            updated.quantity = 2;
            then.status(200).json_body_obj(&updated);
        });
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE).path(format!("/cart/items/{}", line.id));
            then.status(204);
        });

        let client = CartClient::new(&server.base_url()).unwrap();
        let created = client.add_cart_item(new_item.clone()).await.unwrap();
        assert_eq!(created.id, line.id);

        let updated = client
            .update_cart_item(line.id, CartItemPatch::quantity(2))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 2);

        client.remove_cart_item(line.id).await.unwrap();

        add_mock.assert();
        update_mock.assert();
        delete_mock.assert();
    }

    #[tokio::test]
    async fn create_order_posts_payload() {
        let server = MockServer::start();
        let payload = OrderPayload::from_cart("u1", &[sample_line()]).unwrap();
        let order = Order::from_payload(Uuid::new_v4(), payload.clone());

        let order_mock = server.mock(|when, then| {
            when.method(POST).path("/orders").json_body_obj(&payload);
            then.status(201).json_body_obj(&order);
        });

        let client = CartClient::new(&server.base_url()).unwrap();
        let created = client.create_order(payload).await.unwrap();
        assert_eq!(created.id, order.id);
        assert_eq!(created.status, OrderStatus::Pending);
        assert_eq!(created.total_cents, 1000);
        order_mock.assert();
    }

    #[tokio::test]
    async fn error_statuses_map_to_api_errors() {
        let server = MockServer::start();
        let id = Uuid::new_v4();

        server.mock(|when, then| {
            when.method(DELETE).path(format!("/cart/items/{id}"));
            then.status(404)
                .json_body(serde_json::json!({ "error": "cart item missing" }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/orders");
            then.status(400)
                .json_body(serde_json::json!({ "error": "items empty" }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/users/u1/cart");
            then.status(503).body("down");
        });

        let client = CartClient::new(&server.base_url()).unwrap();

        let removed = client.remove_cart_item(id).await;
        assert_eq!(
            removed,
            Err(ApiError::NotFound("cart item missing".into()))
        );

        let payload = OrderPayload::from_cart("u1", &[sample_line()]).unwrap();
        let rejected = client.create_order(payload).await;
        assert_eq!(rejected, Err(ApiError::Rejected("items empty".into())));

        let fetched = client.fetch_cart("u1").await;
        assert!(matches!(fetched, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = CartClient::builder("http://127.0.0.1:9/")
            .unwrap()
            .with_timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let res = client.fetch_cart("u1").await;
        assert!(matches!(res, Err(ApiError::Transport(_))));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(CartClient::new("not a url").is_err());
        assert!(CartClient::new("mailto:someone@example.com").is_err());
    }
}

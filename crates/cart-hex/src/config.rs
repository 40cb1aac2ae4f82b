use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    /// Base URL the cart client talks to.
    pub cart_api_url: String,
    pub cart_api_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let server_port = lookup("SERVER_PORT").unwrap_or_else(|| "3000".into());
        let cart_api_url = lookup("CART_API_URL")
            .unwrap_or_else(|| format!("http://127.0.0.1:{server_port}/"));
        let cart_api_timeout = match lookup("CART_API_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("CART_API_TIMEOUT_MS={raw:?}: {e}"))?;
                Some(Duration::from_millis(ms))
            }
            None => None,
        };
        Ok(Self {
            server_port,
            cart_api_url,
            cart_api_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_client_at_local_server() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_port, "3000");
        assert_eq!(config.cart_api_url, "http://127.0.0.1:3000/");
        assert!(config.cart_api_timeout.is_none());

        let config = Config::from_lookup(lookup(&[("SERVER_PORT", "8080")])).unwrap();
        assert_eq!(config.cart_api_url, "http://127.0.0.1:8080/");
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            ("CART_API_URL", "https://carts.example.com/api/"),
            ("CART_API_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();
        assert_eq!(config.cart_api_url, "https://carts.example.com/api/");
        assert_eq!(config.cart_api_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn bad_timeout_is_an_error() {
        assert!(Config::from_lookup(lookup(&[("CART_API_TIMEOUT_MS", "soon")])).is_err());
    }
}

//! cart-hex: storefront cart core (cart store + identity following) and the inbound HTTP adapter

pub mod config;
pub mod errors;

pub mod application;

pub use cart_types::{domain, ports};

pub mod inbound; // HTTP adapter serving a cart backend as REST

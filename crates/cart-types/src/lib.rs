//! cart-types: domain model and ports shared by the cart store and its adapters

pub mod domain {
    pub mod cart;
    pub mod order;
}

pub mod ports {
    pub mod cart_api;
    pub mod identity;
}

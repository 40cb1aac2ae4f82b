pub mod cart_store;
pub mod identity;

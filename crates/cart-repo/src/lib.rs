//! cart-repo: backends implementing the remote cart API port

#[cfg(not(feature = "memory"))]
compile_error!("Enable a backend feature: `memory`.");

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::InMemoryCartApi;

#[cfg(feature = "memory")]
pub fn build_backend() -> InMemoryCartApi {
    InMemoryCartApi::new()
}

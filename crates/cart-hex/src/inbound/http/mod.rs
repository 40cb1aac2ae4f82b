mod server;

pub use server::{router, HttpServer, HttpServerConfig};

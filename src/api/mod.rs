//! HTTP surface: route handlers, shared state, and server assembly.

pub mod routes;
pub mod server;

pub use server::{build_router, start_server, AppState};

//! # Autosend Gateway
//! HTTP control surface: start/stop the dispatcher and list sent messages.

pub mod routes;
pub mod server;

#[cfg(test)]
mod testing;

pub use server::{AppState, build_router, serve};

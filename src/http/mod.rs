//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace layers)
//!     → handlers.rs
//!         GET /publish/CrConfig → crconfig router → body + Last-Modified
//!         GET /status           → session + operations summary
//! ```

pub mod date;
pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer, CRCONFIG_PATH};

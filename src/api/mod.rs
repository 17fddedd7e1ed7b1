//! HTTP API.
//!
//! Routes are nested under `/api/v1`. Protected routes pass through
//! Auth → Rate Limit → Audit → Handler; public routes skip Auth.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve, start_server, ApiServer, ServerError};
pub use types::ApiContext;

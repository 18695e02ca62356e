//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (correlation id established and attached)
//!     → handlers.rs (boundary logger around the user service call)
//!     → response.rs (domain errors → status + error body)
//!     → Send to client, X-Correlation-Id echoed
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::correlation_middleware;
pub use response::ErrorResponse;
pub use server::{AppState, HttpServer};

//! User management HTTP service with a correlation-aware, redacting
//! request/response logging pipeline.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod users;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

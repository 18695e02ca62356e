//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the user endpoints
//! - Wire up middleware (correlation, tracing, timeout, body limit)
//! - Bind the service graph (repository, hashing, logged service)
//! - Serve until Ctrl+C or a shutdown trigger

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{PaginationConfig, ServiceConfig};
use crate::http::handlers;
use crate::http::request::correlation_middleware;
use crate::observability::InvocationLogger;
use crate::users::{
    Argon2PasswordService, InMemoryUserRepository, LoggedUserService, UserService, UserServiceImpl,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserService>,
    pub logger: InvocationLogger,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// In-memory service graph whose records go to `logger`.
    pub fn in_memory(config: &ServiceConfig, logger: InvocationLogger) -> Self {
        let service = UserServiceImpl::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(Argon2PasswordService::new()),
        );
        Self {
            users: Arc::new(LoggedUserService::new(service, logger.clone())),
            logger,
            pagination: config.pagination.clone(),
        }
    }
}

/// HTTP server for the user service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server logging through `tracing`.
    pub fn new(config: ServiceConfig) -> Self {
        let state = AppState::in_memory(&config, InvocationLogger::default());
        Self::with_state(config, state)
    }

    /// Create a server over an already assembled state.
    pub fn with_state(config: ServiceConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                        }
                        tracing::info!("Shutdown signal received");
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown triggered");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
///
/// The correlation middleware is the outermost layer so every response,
/// timeouts and unmatched routes included, carries the id.
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(handlers::list_users).post(handlers::create_user))
        .route("/api/users/by-email", get(handlers::get_user_by_email))
        .route(
            "/api/users/{id}",
            get(handlers::get_user_by_id).delete(handlers::delete_user),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.timeouts.request_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(correlation_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::invocation::MemorySink;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemorySink>) {
        let config = ServiceConfig::default();
        let sink = Arc::new(MemorySink::new());
        let state = AppState::in_memory(&config, InvocationLogger::new(sink.clone()));
        (build_router(&config, state), sink)
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/users")
            .header("content-type", "application/json")
            .header("x-correlation-id", "abc-123")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_logs_both_layers_with_same_id() {
        let (app, sink) = app();

        let response = app
            .oneshot(create(r#"{"email":"a@b.com","fullName":"Ann","password":"s3cret"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-correlation-id"], "abc-123");
        let body = json(response).await;
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["role"], "CUSTOMER");
        assert!(body.get("passwordHash").is_none());

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[Service] create_user | correlationId=abc-123 | status=SUCCESS"));
        assert!(lines[1].starts_with("[Controller] POST /api/users | status=201"));
        assert!(lines[1].contains("correlationId=abc-123 | handler=users::create_user"));
        assert!(lines.iter().all(|l| l.contains(r#""password":"***""#)));
        assert!(lines.iter().all(|l| !l.contains("s3cret")));
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (app, sink) = app();

        let response = app
            .oneshot(create(r#"{"email":"","password":"pw"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["errorCode"], "METHOD_ARGUMENT_NOT_VALID");
        assert_eq!(body["message"], "email: must not be blank");
        assert_eq!(body["correlationId"], "abc-123");

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[Service][ERROR] create_user"));
        assert!(lines[1].starts_with("[Controller][ERROR] POST /api/users | status=400"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected_without_logging() {
        let (app, sink) = app();

        let response = app.oneshot(create("{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["errorCode"], "METHOD_ARGUMENT_NOT_VALID");
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_and_sort() {
        let (app, _) = app();

        let response = app
            .clone()
            .oneshot(Request::get("/api/users/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(Request::get("/api/users?sort=password").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["message"], "sort: unknown property 'password'");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, sink) = app();

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-correlation-id"));
        assert_eq!(json(response).await["status"], "UP");
        assert!(sink.records().is_empty());
    }
}

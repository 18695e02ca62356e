//! Invocation logging for the HTTP boundary and the service layer.
//!
//! Both loggers wrap a single call, time it, and emit exactly one record for
//! it through a [`LogSink`]: a success line, or a failure line after which the
//! original error is handed back untouched.
//!
//! ```text
//! [Controller] <METHOD> <PATH><?QUERY> | status=.. | duration=..ms | correlationId=.. | handler=.. | args=..
//! [Service] <name> | correlationId=.. | status=SUCCESS | duration=..ms | args=.. | result=..
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::observability::correlation;
use crate::observability::metrics;
use crate::observability::sanitize::{sanitize, Sanitize};

/// Severity of an invocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// Which wrapper produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Controller,
    Service,
}

/// One finished invocation, ready to be written.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub layer: Layer,
    pub correlation_id: String,
    pub duration_ms: u128,
    pub message: String,
}

/// Destination of invocation records.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: LogRecord);
}

/// Writes records as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: LogRecord) {
        let duration_ms = u64::try_from(record.duration_ms).unwrap_or(u64::MAX);
        match (record.level, record.layer) {
            (Level::Info, Layer::Controller) => tracing::info!(
                target: "user_service::controller",
                correlation_id = %record.correlation_id,
                duration_ms,
                "{}",
                record.message
            ),
            (Level::Error, Layer::Controller) => tracing::error!(
                target: "user_service::controller",
                correlation_id = %record.correlation_id,
                duration_ms,
                "{}",
                record.message
            ),
            (Level::Info, Layer::Service) => tracing::info!(
                target: "user_service::service",
                correlation_id = %record.correlation_id,
                duration_ms,
                "{}",
                record.message
            ),
            (Level::Error, Layer::Service) => tracing::error!(
                target: "user_service::service",
                correlation_id = %record.correlation_id,
                duration_ms,
                "{}",
                record.message
            ),
        }
    }
}

/// Keeps records in memory. Used to inspect log output in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Routing metadata of the request served by a handler, logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query,
        }
    }
}

impl fmt::Display for RequestMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// HTTP status a handler failure will be answered with.
pub trait ErrorStatus {
    fn status(&self) -> StatusCode;
}

/// Wraps calls at the HTTP boundary and the service layer.
#[derive(Clone)]
pub struct InvocationLogger {
    sink: Arc<dyn LogSink>,
}

impl Default for InvocationLogger {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for InvocationLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationLogger").finish_non_exhaustive()
    }
}

impl InvocationLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Inner-layer wrapper: logs arguments and the sanitized result.
    ///
    /// Arguments are rendered before `call` is polled.
    pub fn service<T, E, Fut>(
        &self,
        operation: &'static str,
        args: &[&dyn Sanitize],
        call: Fut,
    ) -> impl Future<Output = Result<T, E>>
    where
        Fut: Future<Output = Result<T, E>>,
        T: Sanitize,
        E: fmt::Display,
    {
        let start = Instant::now();
        let correlation_id = correlation::current_or_sentinel();
        let args = sanitize(args);
        let sink = self.sink.clone();

        async move {
            let outcome = call.await;
            let duration_ms = start.elapsed().as_millis();

            let (level, message) = match &outcome {
                Ok(result) => {
                    let result = sanitize(&[result]);
                    metrics::record_operation(operation, "success");
                    (
                        Level::Info,
                        format!(
                            "[Service] {operation} | correlationId={correlation_id} | status=SUCCESS \
                             | duration={duration_ms}ms | args={args} | result={result}"
                        ),
                    )
                }
                Err(error) => {
                    metrics::record_operation(operation, "failure");
                    (
                        Level::Error,
                        format!(
                            "[Service][ERROR] {operation} | correlationId={correlation_id} | status=FAILED \
                             | duration={duration_ms}ms | error={error} | args={args}"
                        ),
                    )
                }
            };

            sink.emit(LogRecord {
                level,
                layer: Layer::Service,
                correlation_id,
                duration_ms,
                message,
            });
            outcome
        }
    }

    /// Boundary-layer wrapper: logs the request line and the response status.
    pub fn controller<R, E, Fut>(
        &self,
        request: RequestMeta,
        handler: &'static str,
        args: &[&dyn Sanitize],
        call: Fut,
    ) -> impl Future<Output = Result<Response, E>>
    where
        Fut: Future<Output = Result<R, E>>,
        R: IntoResponse,
        E: fmt::Display + ErrorStatus,
    {
        let start = Instant::now();
        let correlation_id = correlation::current_or_sentinel();
        let args = sanitize(args);
        let sink = self.sink.clone();

        async move {
            let outcome = call.await.map(IntoResponse::into_response);
            let duration_ms = start.elapsed().as_millis();

            let (level, message, status) = match &outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    (
                        Level::Info,
                        format!(
                            "[Controller] {request} | status={status} | duration={duration_ms}ms \
                             | correlationId={correlation_id} | handler={handler} | args={args}"
                        ),
                        status,
                    )
                }
                Err(error) => {
                    let status = error.status().as_u16();
                    (
                        Level::Error,
                        format!(
                            "[Controller][ERROR] {request} | status={status} | duration={duration_ms}ms \
                             | correlationId={correlation_id} | handler={handler} | error={error} | args={args}"
                        ),
                        status,
                    )
                }
            };

            metrics::record_request(&request.method, handler, status, start);
            sink.emit(LogRecord {
                level,
                layer: Layer::Controller,
                correlation_id,
                duration_ms,
                message,
            });
            outcome
        }
    }
}

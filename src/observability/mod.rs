//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → correlation.rs (establish id, attach to the request's task)
//!     → invocation.rs (boundary logger around the handler)
//!         → sanitize.rs (arguments → redacted JSON)
//!         → invocation.rs (inner logger around the business operation)
//!     → one log record per wrapped call → LogSink → tracing
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Correlation id lives in task-local storage, never a global map
//! - Redaction is declared per type, not discovered at runtime
//! - Loggers are explicit wrappers applied at their call sites
//! - Metrics are cheap (no-ops without an installed recorder)

pub mod correlation;
pub mod invocation;
pub mod logging;
pub mod metrics;
pub mod sanitize;

pub use correlation::{CorrelationId, X_CORRELATION_ID};
pub use invocation::{InvocationLogger, LogRecord, LogSink};
pub use sanitize::{sanitize, Sanitize, SanitizedValue, Sanitizer};

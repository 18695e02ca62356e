//! Request-scoped correlation id propagation.
//!
//! An id is established once per inbound request and attached to the task
//! that serves it with [`scope`]. Everything awaited inside the scope sees the
//! same id through [`current`]; when the scope's future completes, fails,
//! panics or is dropped the slot is released again.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

/// Header used both to accept a caller supplied id and to echo the resolved one.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Token reported by code running outside of any request scope.
pub const NO_CORRELATION_ID: &str = "no-cid";

tokio::task_local! {
    static CURRENT: CorrelationId;
}

/// Opaque per-request token joining all log lines of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Fresh random id rendered as a hyphenated UUID.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the id for a new request.
///
/// A supplied id that is not blank is reused verbatim, anything else yields a
/// freshly generated one.
pub fn establish(supplied: Option<&str>) -> CorrelationId {
    match supplied {
        Some(id) if !id.trim().is_empty() => {
            tracing::debug!(correlation_id = %id, "Using existing correlationId");
            CorrelationId(Arc::from(id))
        }
        _ => {
            let id = CorrelationId::generate();
            tracing::debug!(correlation_id = %id, "Generated new correlationId");
            id
        }
    }
}

/// Id of the request the calling task is serving, if any.
pub fn current() -> Option<CorrelationId> {
    CURRENT.try_with(Clone::clone).ok()
}

/// Id of the current request, or [`NO_CORRELATION_ID`] outside a request.
pub fn current_or_sentinel() -> String {
    current()
        .map(|id| id.to_string())
        .unwrap_or_else(|| NO_CORRELATION_ID.to_string())
}

/// Run `fut` with `id` attached; the id is detached when `fut` finishes.
pub async fn scope<F>(id: CorrelationId, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(id, fut).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<F, R>(id: CorrelationId, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT.sync_scope(id, f)
}

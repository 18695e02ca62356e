//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! main: load config → init logging/metrics → bind → serve
//! shutdown: Ctrl+C or Shutdown::trigger → stop accepting → drain in-flight requests
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;

//! Process-wide tracing setup shared by the catalog binaries and tests.

/// Initialize structured JSON logging with the default `info` filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filters, JSON formatting).
pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, init_with_filter};

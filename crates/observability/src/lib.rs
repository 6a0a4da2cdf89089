//! Tracing and logging setup shared by the binaries and black-box tests.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide logging with `default_level` as the filter when
/// `RUST_LOG` is unset.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init(default_level: &str) {
    tracing::init(default_level);
}

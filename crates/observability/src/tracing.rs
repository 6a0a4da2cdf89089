//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// JSON logs with timestamps, configurable via `RUST_LOG`.
pub fn init(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Human-readable output captured by the test harness.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_a_no_op() {
        init("info");
        init("debug");
        ::tracing::info!("still logging");
    }

    #[test]
    fn bad_level_falls_back() {
        let f = filter("not a level ===");
        assert!(!f.to_string().is_empty());
    }
}

// Common test utilities shared across test files

use uri_template_engine::MultivaluedMap;

/// Install a tracing subscriber honoring RUST_LOG, once per test binary
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a values map from name/value pairs, keeping repeated names
#[allow(dead_code)]
pub fn values(pairs: &[(&str, &str)]) -> MultivaluedMap<String> {
    pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

/// Subscriber that records every level down to TRACE, for running code with all logging enabled
#[allow(dead_code)]
pub fn verbose_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish()
}

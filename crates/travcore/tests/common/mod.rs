use tracing_subscriber::EnvFilter;

/// Installs a test-scoped tracing subscriber once per process, the same way
/// the teacher's own integration suites bring up logging before driving a
/// multi-file scenario. Safe to call from every test - `try_init` is a no-op
/// on the second and later calls.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Shared test infrastructure for the scenario tests in this directory.

pub mod fixtures;

/// Wire up a console subscriber so `tracing` events emitted during
/// validation are visible with `RUST_LOG=debug cargo test -- --nocapture`.
/// Safe to call from every test; the second and later calls just fail to
/// re-init and are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

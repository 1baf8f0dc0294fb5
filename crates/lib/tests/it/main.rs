/*! Integration tests for Stratum.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - backend: Tests for the ItemStore trait against every store implementation
 * - engine: Tests for the Engine (depth cascade, guard, error kinds)
 * - filter: Tests for list queries through the Engine
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("stratum=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod backend;
mod engine;
mod filter;
mod helpers;

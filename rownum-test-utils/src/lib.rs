use std::sync::Once;

static INIT: Once = Once::new();

/// Default filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_TEST_FILTER: &str = "info";

/// Initialize tracing for test binaries. Safe to call multiple times.
///
/// Honors `RUST_LOG`; set `RUST_LOG=rownum_topn=trace` to see arena growth
/// and drain events from the accumulator.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let env = std::env::var("RUST_LOG").ok();
        let filter = match env {
            Some(_) => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER)),
            None => EnvFilter::new(DEFAULT_TEST_FILTER),
        };
        // `try_init` so a subscriber installed by the test harness wins.
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(feature = "auto-init")]
mod auto {
    // Use ctor to run at binary init time to avoid having to call init in every test.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}

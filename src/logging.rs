use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static LOGGER: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber. Idempotent; later calls are
/// no-ops. `RUST_LOG` overrides the filter only in debug mode.
pub fn init(debug: bool) {
    LOGGER.get_or_init(|| {
        let filter = if debug {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("multi_clip=debug"))
        } else {
            EnvFilter::new("multi_clip=info")
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init();
    });
}

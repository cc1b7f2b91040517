pub mod app;

use tracing_subscriber::EnvFilter;

/// Logs go to stderr so `--json` output on stdout stays parseable
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playerdata_relocator=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

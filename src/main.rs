//! memcheck-harness CLI entry point

fn main() {
    // Structured logging to stderr with env-based filter, defaulting to info.
    // stdout is reserved for command lines and forwarded child output.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    memcheck_harness::cli::run();
}

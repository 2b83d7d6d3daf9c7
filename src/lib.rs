pub mod catalog;
pub mod config;
pub mod covid;
pub mod csv_file;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod plan;
pub mod population;
pub mod table;

/// Install the `tracing` subscriber used by every binary.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
}

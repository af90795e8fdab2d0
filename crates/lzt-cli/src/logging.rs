use anyhow::{Result, anyhow};
use lzt_conformance::{LogFormat, config::LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `LZT_LOG`, then `RUST_LOG`, take precedence
/// over the configured level. Logs go to stderr so reports stay pipeable.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_env("LZT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).try_init()
        }
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Pretty => subscriber.pretty().try_init(),
    }
    .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to the console and, when `log_dir` is given, to a
/// daily-rotated JSON file in that directory.
pub fn init_logging(log_dir: Option<&str>) -> anyhow::Result<()> {
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "massive-screener.log");
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(appender)
                    .with_target(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .json(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .with(file_layer)
        // RUST_LOG wins; info otherwise
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()?;

    Ok(())
}

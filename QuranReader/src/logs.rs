use quranconfig::Config;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber
///
/// `RUST_LOG` wins over `host.logger.min_level`. Events go to stderr so
/// that command output stays clean on stdout.
pub fn init_logging(config: &Config) {
    let level = match config.get_log_min_level() {
        Ok(l) => string_to_level(&l).map_or(LevelFilter::INFO, LevelFilter::from_level),
        Err(_) => LevelFilter::INFO,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    let subscriber = Registry::default().with(filter);

    if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    } else {
        subscriber.init();
    }
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

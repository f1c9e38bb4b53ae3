//! Logging setup for the `stresstest` binary.

use std::env;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Installs a global subscriber that logs to stderr.
pub fn initialize_tracing() {
    let (level, env_filter) = parse_rust_log();
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(env_filter)
        .init();
}

/// Reads `RUST_LOG` as a maximum level, or as a literal filter if it is not a plain level.
pub fn parse_rust_log() -> (Level, EnvFilter) {
    let value = env::var(EnvFilter::DEFAULT_ENV).ok();
    parse_filter(value.as_deref())
}

fn parse_filter(value: Option<&str>) -> (Level, EnvFilter) {
    let level = match value {
        Some(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        None => Level::INFO,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        stresstest=TRACE,\
        logstress_sink=TRACE,\
        logstress_report=TRACE,\
        ",
    );

    (level, env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level() {
        let (level, _) = parse_filter(Some("debug"));
        assert_eq!(level, Level::DEBUG);
    }

    #[test]
    fn default_level() {
        let (level, _) = parse_filter(None);
        assert_eq!(level, Level::INFO);
    }

    #[test]
    fn literal_filter() {
        let (level, filter) = parse_filter(Some("stresstest::sampler=debug"));
        assert_eq!(level, Level::TRACE);
        assert!(filter.to_string().contains("stresstest::sampler"));
    }
}

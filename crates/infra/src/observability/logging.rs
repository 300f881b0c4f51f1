use levelset_domain::constants::DEFAULT_LOG_LEVEL;
use levelset_domain::{LevelsetError, LogFormat, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Resolve the log filter
///
/// A parseable `env_directives` (the value of `RUST_LOG`) wins over the
/// configured level; an unparseable configured level falls back to
/// `info`.
pub fn build_filter(env_directives: Option<&str>, configured: &str) -> EnvFilter {
    env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber
///
/// # Errors
/// Returns `LevelsetError::Internal` if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), &config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => {
            let json = fmt::layer().json().with_current_span(true).flatten_event(true);
            registry.with(json).try_init()
        }
    };

    installed.map_err(|e| LevelsetError::Internal(format!("failed to install tracing: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_directives_win() {
        let filter = build_filter(Some("levelset_core=trace"), "warn");
        assert_eq!(filter.to_string(), "levelset_core=trace");
    }

    #[test]
    fn test_configured_level_used_without_env() {
        assert_eq!(build_filter(None, "debug").to_string(), "debug");
    }

    #[test]
    fn test_invalid_directives_fall_back() {
        let filter = build_filter(Some("levelset=loud"), "levelset=quiet");
        assert_eq!(filter.to_string(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);

        assert!(matches!(init_tracing(&config), Err(LevelsetError::Internal(_))));
    }
}

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. When `RUST_LOG` is set it alone decides
/// what is logged and `verbose` is ignored.
pub fn init_logging(verbose: bool) {
    let (env_filter, app_filter) = filters(EnvFilter::try_from_default_env().ok(), verbose);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(app_filter)
        .with(env_filter)
        .init();
}

fn filters(from_env: Option<EnvFilter>, verbose: bool) -> (EnvFilter, Option<Targets>) {
    if let Some(env_filter) = from_env {
        return (env_filter, None);
    }

    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::INFO, "info")
    };
    let app_filter = Targets::new()
        .with_target("ucs_monitor", level_filter)
        .with_target("tower_http", level_filter);
    (EnvFilter::new(level), Some(app_filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_env_filter_replaces_target_caps() {
        let (_, app_filter) = filters(Some(EnvFilter::new("ucs_monitor=trace")), false);
        assert!(app_filter.is_none());
    }

    #[test]
    fn test_verbose_raises_app_targets() {
        let (_, quiet) = filters(None, false);
        let quiet = quiet.unwrap();
        assert!(quiet.would_enable("ucs_monitor::http", &Level::INFO));
        assert!(!quiet.would_enable("ucs_monitor::http", &Level::DEBUG));

        let (_, verbose) = filters(None, true);
        assert!(verbose.unwrap().would_enable("ucs_monitor::core", &Level::DEBUG));
    }
}

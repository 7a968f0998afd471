use eyre::Context;
use std::env;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    layer::SubscriberExt,
    Layer, Registry,
};

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Build the target filter
///
/// `RUST_LOG` takes precedence. Without it everything is logged at `INFO`, or `DEBUG` in verbose mode
fn targets(rust_log: Option<&str>, verbose: bool) -> eyre::Result<Targets> {
    match rust_log {
        Some(targets) => targets.parse().context("Failed to parse RUST_LOG value"),
        None => Ok(Targets::default().with_default(default_level(verbose))),
    }
}

/// Install the global tracing subscriber
pub fn initialise(verbose: bool) -> eyre::Result<()> {
    let rust_log = env::var("RUST_LOG").ok();
    let env_filter = targets(rust_log.as_deref(), verbose)
        .unwrap_or_else(|_| Targets::default().with_default(default_level(verbose)));

    let subscriber = Registry::default()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)
        .context("Couldn't install the global tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::targets;
    use tracing::Level;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn verbose_fallback() {
        let filter = targets(None, true).unwrap();
        assert!(filter.would_enable("sigproxy_proxy", &Level::DEBUG));

        let filter = targets(None, false).unwrap();
        assert!(!filter.would_enable("sigproxy_proxy", &Level::DEBUG));
        assert!(filter.would_enable("sigproxy_proxy", &Level::INFO));
    }

    #[test]
    fn rust_log_wins() {
        let filter = targets(Some("warn,sigproxy_proxy=trace"), false).unwrap();
        assert!(filter.would_enable("sigproxy_proxy::listener", &Level::TRACE));
        assert!(!filter.would_enable("hyper", &Level::INFO));
        assert_eq!(filter.default_level(), Some(LevelFilter::WARN));
    }
}

#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Picks the filter directive. `RUST_LOG` wins when set; otherwise each `-v`
/// raises the configured level one step.
#[must_use]
pub fn filter_directive(verbosity: u8, configured: &str) -> String {
    let level = match verbosity {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("{level},todoboard={level}")
}

/// Installs the stderr subscriber. A second call is a no-op.
pub fn init(verbosity: u8, configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity, configured)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_configured_level() {
        assert_eq!(filter_directive(0, "warn"), "warn,todoboard=warn");
        assert_eq!(filter_directive(1, "warn"), "info,todoboard=info");
        assert_eq!(filter_directive(2, "error"), "debug,todoboard=debug");
        assert_eq!(filter_directive(7, "warn"), "trace,todoboard=trace");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(0, "warn");
        init(3, "warn");
    }
}

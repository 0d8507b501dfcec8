//! # Logging
//!
//! Opt-in tracing setup for binaries and tests embedding the crate. The
//! library itself only emits events; nothing is initialized unless the
//! host calls [`init`]. Hosts that install their own subscriber keep it,
//! since initialization goes through `try_init`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging filtered by `QUARRY_LOG`, falling back to
/// `RUST_LOG` and then to `info`
pub fn init() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(env_filter()),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

fn env_filter() -> EnvFilter {
    if let Ok(directives) = std::env::var("QUARRY_LOG") {
        return EnvFilter::new(directives);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_env_override() {
        std::env::set_var("QUARRY_LOG", "quarry_orm=trace");
        let filter = env_filter();
        assert!(filter.to_string().contains("quarry_orm=trace"));
        std::env::remove_var("QUARRY_LOG");
    }
}

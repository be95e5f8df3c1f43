use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVES: &str = "posthook=info,tower_http=info";

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init(json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(true)).try_init()
    };

    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

mod config;

use anyhow::Result;
use config::{LogFormat, ObservabilityConfig};
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so `TZ=America/Araguaina` shows `-03:00` in logs.
    let timer = tracing_subscriber::fmt::time::ChronoLocal::rfc_3339();

    let fmt_layer = match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer().with_timer(timer).boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_timer(timer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            service = %config.service_context.service_name,
            environment = %config.service_context.environment,
            component = %config.service_context.component,
            warning = %warning,
            "Observability config warning"
        );
    }

    info!(
        service = %config.service_context.service_name,
        environment = %config.service_context.environment,
        component = %config.service_context.component,
        json = config.log_format == LogFormat::Json,
        "Logging initialized"
    );

    Ok(())
}

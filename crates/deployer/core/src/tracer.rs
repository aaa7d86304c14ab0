use std::env;

use anyhow::Result;
#[cfg(feature = "otlp")]
use opentelemetry_otlp as otlp;
use tracing::{dispatcher, Subscriber};
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, Layer, Registry,
};

const KEY: &str = "RUST_LOG";

fn init_once_opentelemetry(service_name: &str, export: bool) -> Result<()> {
    #[cfg(feature = "otlp")]
    use opentelemetry_sdk::runtime::Tokio as Runtime;

    // Skip init if has been set
    if dispatcher::has_been_set() {
        return Ok(());
    }

    // Set default service name
    {
        const SERVICE_NAME_KEY: &str = "OTEL_SERVICE_NAME";

        if env::var_os(SERVICE_NAME_KEY).is_none() {
            env::set_var(SERVICE_NAME_KEY, service_name);
        }
    }

    #[cfg(feature = "otlp")]
    fn init_otlp_pipeline() -> otlp::TonicExporterBuilder {
        otlp::new_exporter().tonic()
    }

    fn init_layer_env_filter<S>() -> impl Layer<S>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        ::tracing_subscriber::EnvFilter::from_default_env()
    }

    fn init_layer_stdfmt<S>() -> impl Layer<S>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        ::tracing_subscriber::fmt::layer()
    }

    #[cfg(feature = "logs")]
    fn init_layer_otlp_logger<S>() -> Result<impl Layer<S>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        otlp::new_pipeline()
            .logging()
            .with_exporter(init_otlp_pipeline())
            .install_batch(Runtime)
            .map(|provider| {
                ::opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(&provider)
            })
            .map_err(|error| ::anyhow::anyhow!("failed to init a logger: {error}"))
    }

    #[cfg(feature = "metrics")]
    fn init_layer_otlp_metrics<S>() -> Result<impl Layer<S>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        otlp::new_pipeline()
            .metrics(Runtime)
            .with_exporter(init_otlp_pipeline())
            .build()
            .map(::tracing_opentelemetry::MetricsLayer::new)
            .map_err(|error| ::anyhow::anyhow!("failed to init a metrics: {error}"))
    }

    #[cfg(feature = "trace")]
    fn init_layer_otlp_tracer<S>() -> Result<impl Layer<S>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        otlp::new_pipeline()
            .tracing()
            .with_exporter(init_otlp_pipeline())
            .install_batch(Runtime)
            .map(::tracing_opentelemetry::OpenTelemetryLayer::new)
            .map_err(|error| ::anyhow::anyhow!("failed to init a tracer: {error}"))
    }

    let layer = Registry::default()
        .with(init_layer_env_filter())
        .with(init_layer_stdfmt());

    if export {
        #[cfg(feature = "logs")]
        let layer = layer.with(init_layer_otlp_logger()?);
        #[cfg(feature = "metrics")]
        let layer = layer.with(init_layer_otlp_metrics()?);
        #[cfg(feature = "trace")]
        let layer = layer.with(init_layer_otlp_tracer()?);

        layer.try_init().map_err(Into::into)
    } else {
        layer.try_init().map_err(Into::into)
    }
}

/// Installs the global subscriber, exporting to OTLP when the telemetry features are enabled.
pub fn init_once(service_name: &str) -> Result<()> {
    init_once_with_default(service_name, cfg!(feature = "otlp"))
}

pub fn init_once_with_default(service_name: &str, export: bool) -> Result<()> {
    // Skip init if has been set
    if dispatcher::has_been_set() {
        return Ok(());
    }

    // set default tracing level
    if env::var_os(KEY).is_none() {
        env::set_var(KEY, "INFO");
    }

    init_once_opentelemetry(service_name, export)
}

//! Tracing subscriber setup with optional OpenTelemetry export.
//!
//! Console output is always installed. When `OTEL_EXPORTER_OTLP_ENDPOINT`
//! is set, spans and log records are additionally exported over OTLP/HTTP.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

const SERVICE_NAME: &str = "fairmeet";

/// Handle to the installed telemetry pipeline.
///
/// Keep it alive for the lifetime of the process and call
/// [`Telemetry::shutdown`] before exiting so batched spans get flushed.
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl Telemetry {
    /// Flush and shut down the OTLP exporters, if any were installed.
    pub fn shutdown(&self) {
        if let Some(provider) = &self.tracer_provider {
            let _ = provider.shutdown();
        }
        if let Some(provider) = &self.logger_provider {
            let _ = provider.shutdown();
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init(config: &LoggingConfig) -> Result<Telemetry> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let fmt_layer = match config.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    let mut telemetry = Telemetry {
        tracer_provider: None,
        logger_provider: None,
    };
    let mut span_layer = None;
    let mut bridge_layer = None;

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        let resource = Resource::builder()
            .with_attributes(vec![
                KeyValue::new("service.name", SERVICE_NAME),
                KeyValue::new("service.version", crate::VERSION),
            ])
            .build();

        let span_exporter = SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(&endpoint)
            .build()
            .context("Failed to build OTLP span exporter")?;
        let tracer_provider = SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_batch_exporter(span_exporter)
            .build();

        let log_exporter = LogExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(&endpoint)
            .build()
            .context("Failed to build OTLP log exporter")?;
        let logger_provider = SdkLoggerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(log_exporter)
            .build();

        global::set_tracer_provider(tracer_provider.clone());

        let tracer = tracer_provider.tracer(SERVICE_NAME);
        span_layer = Some(OpenTelemetryLayer::new(tracer));
        bridge_layer = Some(OpenTelemetryTracingBridge::new(&logger_provider));

        telemetry.tracer_provider = Some(tracer_provider);
        telemetry.logger_provider = Some(logger_provider);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(span_layer)
        .with(bridge_layer)
        .init();

    Ok(telemetry)
}

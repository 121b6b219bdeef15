//! Tracing subscriber setup shared by the ringdb binaries.
//!
//! Filtering follows `RUST_LOG` when set and falls back to `info`.
use anyhow::Context;
use opentelemetry::sdk::propagation::TraceContextPropagator;
use opentelemetry::sdk::trace::BatchConfig;
use opentelemetry::sdk::{trace, Resource};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

const SERVICE_NAME: &str = "ringdb";

/// Where spans and events end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracingOutput {
    /// human readable lines on stdout
    Stdout,
    /// bunyan formatted json on stdout
    Json,
    /// spans exported to an OTLP collector (eg: jaeger) listening on the given endpoint
    Otlp(String),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Must be called once, before any span is created
pub fn initialize_subscriber(output: TracingOutput) -> anyhow::Result<()> {
    match output {
        TracingOutput::Stdout => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        TracingOutput::Json => {
            Registry::default()
                .with(env_filter())
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new(
                    SERVICE_NAME.to_string(),
                    std::io::stdout,
                ))
                .try_init()?;
        }
        TracingOutput::Otlp(exporter_endpoint) => {
            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(exporter_endpoint);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(trace::config().with_resource(Resource::new(vec![
                    KeyValue::new(
                        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                        SERVICE_NAME.to_string(),
                    ),
                ])))
                .with_batch_config(BatchConfig::default().with_max_queue_size(1024 * 1024))
                .install_batch(opentelemetry::runtime::Tokio)
                .context("Failed to initialize the OTLP tracer")?;

            global::set_text_map_propagator(TraceContextPropagator::new());

            Registry::default()
                .with(env_filter())
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .with(JsonStorageLayer)
                .try_init()?;
        }
    }

    Ok(())
}

/// Flushes spans still buffered by the OTLP exporter. A no-op for the other outputs
pub fn shutdown() {
    global::shutdown_tracer_provider();
}

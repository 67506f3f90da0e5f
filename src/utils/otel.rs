//! Observability
//!
//! Installs the global tracing subscriber: an env-filtered fmt layer, plus an
//! OTLP span exporter when enabled.

use anyhow::Result;
use opentelemetry::trace::TracerProvider; // Import trait for .tracer()
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::{propagation::TraceContextPropagator, runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const DEFAULT_FILTER: &str = "qaree_gateway=info,tower_http=info";

/// Flushes exported spans when dropped
pub struct OtelGuard {
    otlp: bool,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if self.otlp {
            global::shutdown_tracer_provider();
        }
    }
}

pub fn init_telemetry(service_name: &str, otlp: bool) -> Result<OtelGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let telemetry = if otlp {
        global::set_text_map_propagator(TraceContextPropagator::new());

        // endpoint comes from OTEL_EXPORTER_OTLP_ENDPOINT
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .build_span_exporter()?;

        let trace_config = sdktrace::Config::default().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ]));

        let provider = sdktrace::TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_config(trace_config)
            .build();

        global::set_tracer_provider(provider.clone());
        let tracer = provider.tracer(service_name.to_string());
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    Registry::default()
        .with(filter)
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;

    Ok(OtelGuard { otlp })
}

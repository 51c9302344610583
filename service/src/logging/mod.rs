use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "origin-resizer";
const DEFAULT_FILTER: &str = "info";

/// JSON logs on stdout filtered by `RUST_LOG`, plus OpenTelemetry spans on
/// stdout when `trace_stdout` is set. The returned provider must be shut down
/// to flush spans.
pub fn logger_setup(trace_stdout: bool) -> anyhow::Result<Option<TracerProvider>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let provider = trace_stdout.then(|| {
        TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build()
    });
    let otel_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(false),
        )
        .with(otel_layer)
        .try_init()?;

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
    Ok(provider)
}

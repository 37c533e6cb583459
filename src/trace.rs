//! Logging, plus OpenTelemetry export when an OTLP collector is configured.

use std::time::Duration;

use opentelemetry::{global, metrics::MetricsError, trace::TraceError, KeyValue};
use opentelemetry_otlp::{TonicExporterBuilder, WithExportConfig};
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		MeterProviderBuilder, PeriodicReader, SdkMeterProvider,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const METRICS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("tracer setup failed: {0}")]
	Trace(#[from] TraceError),
	#[error("meter setup failed: {0}")]
	Metrics(#[from] MetricsError),
}

fn environment() -> &'static str {
	if cfg!(debug_assertions) {
		"development"
	} else {
		"production"
	}
}

/// Describes this service to the collector.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(DEPLOYMENT_ENVIRONMENT, environment()),
		],
		SCHEMA_URL,
	)
}

/// Where spans and metrics are sent.
struct Collector<'a> {
	endpoint: &'a str,
}

impl Collector<'_> {
	fn exporter(&self) -> TonicExporterBuilder {
		opentelemetry_otlp::new_exporter()
			.tonic()
			.with_endpoint(self.endpoint)
	}

	fn meter_provider(&self) -> Result<SdkMeterProvider, MetricsError> {
		let exporter = self.exporter().build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

		let mut builder = MeterProviderBuilder::default()
			.with_resource(resource())
			.with_reader(
				PeriodicReader::builder(exporter, runtime::Tokio)
					.with_interval(METRICS_INTERVAL)
					.build(),
			);

		// Development builds also print metrics to stdout.
		if cfg!(debug_assertions) {
			builder = builder.with_reader(
				PeriodicReader::builder(
					opentelemetry_stdout::MetricsExporter::default(),
					runtime::Tokio,
				)
				.build(),
			);
		}

		let provider = builder.build();
		global::set_meter_provider(provider.clone());

		Ok(provider)
	}

	fn tracer(&self) -> Result<Tracer, TraceError> {
		opentelemetry_otlp::new_pipeline()
			.tracing()
			.with_trace_config(
				opentelemetry_sdk::trace::Config::default()
					.with_sampler(Sampler::AlwaysOn)
					.with_resource(resource()),
			)
			.with_batch_config(BatchConfig::default())
			.with_exporter(self.exporter())
			.install_batch(runtime::Tokio)
	}
}

/// Initializes the tracing subscriber.
///
/// Logs always go to stdout at INFO. With an OTLP endpoint, spans and metrics
/// are exported too, and the returned guard flushes them when dropped.
pub fn init_tracing_subscriber(otlp_endpoint: Option<&str>) -> Result<Option<OtelGuard>, Error> {
	let registry = tracing_subscriber::registry()
		.with(LevelFilter::from_level(Level::INFO))
		.with(tracing_subscriber::fmt::layer().with_ansi(true));

	let Some(endpoint) = otlp_endpoint else {
		registry.init();
		return Ok(None);
	};

	let collector = Collector { endpoint };
	let meter_provider = collector.meter_provider()?;
	let tracer = collector.tracer()?;

	registry
		.with(MetricsLayer::new(meter_provider.clone()))
		.with(tracing_opentelemetry::layer().with_tracer(tracer))
		.init();

	tracing::info!(endpoint, "exporting traces and metrics");

	Ok(Some(OtelGuard { meter_provider }))
}

/// Flushes and shuts down the exporters when dropped.
pub struct OtelGuard {
	meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if let Err(error) = self.meter_provider.shutdown() {
			eprintln!("failed to shut down the meter provider: {error}");
		}

		global::shutdown_tracer_provider();
	}
}

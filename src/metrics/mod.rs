//! Prometheus metrics for the prediction pipelines.
//!
//! Every pipeline run is counted by outcome and timed; the latest held-out
//! scores are exposed as gauges so dashboards can track model quality per snapshot.
//!
//! # Example
//! ```no_run
//! use district_safety_analytics::metrics::{init_metrics, gather_metrics, PIPELINE_RUNS_TOTAL};
//!
//! init_metrics().unwrap();
//! PIPELINE_RUNS_TOTAL
//!     .with_label_values(&["crime_regression", "success"])
//!     .inc();
//! println!("{}", gather_metrics());
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};
use std::time::Instant;

const NAMESPACE: &str = "district_safety_analytics";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Pipeline invocations
    ///
    /// Labels: pipeline, status
    pub static ref PIPELINE_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("pipeline_runs_total", "Total number of prediction pipeline runs")
            .namespace(NAMESPACE),
        &["pipeline", "status"]
    ).expect("Failed to create PIPELINE_RUNS_TOTAL metric");

    /// Wall-clock time of a pipeline run, feature building through evaluation
    ///
    /// Labels: pipeline
    pub static ref PIPELINE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "pipeline_duration_seconds",
            "Prediction pipeline duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["pipeline"]
    ).expect("Failed to create PIPELINE_DURATION_SECONDS metric");

    /// Held-out mean absolute error of the latest crime regression
    pub static ref CRIME_MODEL_MAE: Gauge = Gauge::with_opts(
        Opts::new("crime_model_mae", "Mean absolute error of the latest crime-count model")
            .namespace(NAMESPACE)
    ).expect("Failed to create CRIME_MODEL_MAE metric");

    /// Held-out accuracy of the latest safety classification
    pub static ref SAFETY_MODEL_ACCURACY: Gauge = Gauge::with_opts(
        Opts::new("safety_model_accuracy", "Accuracy of the latest safety classifier")
            .namespace(NAMESPACE)
    ).expect("Failed to create SAFETY_MODEL_ACCURACY metric");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless; already registered collectors are skipped.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(PIPELINE_RUNS_TOTAL.clone()))?;
    register(Box::new(PIPELINE_DURATION_SECONDS.clone()))?;
    register(Box::new(CRIME_MODEL_MAE.clone()))?;
    register(Box::new(SAFETY_MODEL_ACCURACY.clone()))?;
    Ok(())
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Export metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

/// Times one pipeline run and records its outcome
pub struct PipelineTimer {
    pipeline: &'static str,
    started: Instant,
}

impl PipelineTimer {
    pub fn start(pipeline: &'static str) -> Self {
        Self {
            pipeline,
            started: Instant::now(),
        }
    }

    /// Record duration and outcome; returns elapsed seconds
    pub fn finish(self, success: bool) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        let status = if success { "success" } else { "error" };

        PIPELINE_DURATION_SECONDS
            .with_label_values(&[self.pipeline])
            .observe(elapsed);
        PIPELINE_RUNS_TOTAL
            .with_label_values(&[self.pipeline, status])
            .inc();

        elapsed
    }
}

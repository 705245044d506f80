use std::future::Future;
use std::time::Instant;

use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

lazy_static::lazy_static! {
    pub static ref RECONCILE_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "addon_operator_reconcile_total",
            "Total number of reconciliations"
        ),
        &["controller", "result"]
    )
    .unwrap();

    pub static ref RECONCILE_DURATION: HistogramVec = prometheus::register_histogram_vec!(
        HistogramOpts::new(
            "addon_operator_reconcile_duration_seconds",
            "Duration of reconciliations in seconds"
        ),
        &["controller"]
    )
    .unwrap();

    pub static ref OCM_API_REQUEST_DURATION: Histogram = prometheus::register_histogram!(
        HistogramOpts::new(
            "addon_operator_ocm_api_requests_durations",
            "OCM API request latencies in microseconds"
        )
        .buckets(vec![
            10_000.0, 50_000.0, 100_000.0, 250_000.0, 500_000.0, 1_000_000.0, 2_500_000.0,
            5_000_000.0, 10_000_000.0,
        ])
    )
    .unwrap();

    pub static ref UPGRADE_POLICY_REPORTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "addon_operator_upgrade_policy_reports_total",
            "Upgrade policy states successfully reported to OCM"
        ),
        &["value"]
    )
    .unwrap();
}

pub fn increment_reconcile_total(controller: &str, result: &str) {
    RECONCILE_TOTAL.with_label_values(&[controller, result]).inc();
}

pub fn observe_reconcile_duration(controller: &str, duration_secs: f64) {
    RECONCILE_DURATION
        .with_label_values(&[controller])
        .observe(duration_secs);
}

pub fn increment_upgrade_policy_reports(value: &str) {
    UPGRADE_POLICY_REPORTS_TOTAL
        .with_label_values(&[value])
        .inc();
}

/// Sink for OCM request latencies.
pub trait DurationRecorder: Send + Sync {
    fn record_ocm_api_request(&self, micros: f64);
}

/// Records OCM latencies into the process-wide Prometheus registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusRecorder;

impl DurationRecorder for PrometheusRecorder {
    fn record_ocm_api_request(&self, micros: f64) {
        OCM_API_REQUEST_DURATION.observe(micros);
    }
}

/// Await `request` and report its latency in microseconds to `recorder`.
///
/// The outcome of `request` is returned untouched; without a recorder the
/// request simply runs unmetered.
pub async fn record_ocm_request_duration<F, T>(
    recorder: Option<&dyn DurationRecorder>,
    request: F,
) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = request.await;
    if let Some(recorder) = recorder {
        recorder.record_ocm_api_request(start.elapsed().as_secs_f64() * 1_000_000.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingRecorder(Mutex<Vec<f64>>);

    impl DurationRecorder for CollectingRecorder {
        fn record_ocm_api_request(&self, micros: f64) {
            self.0.lock().unwrap().push(micros);
        }
    }

    #[tokio::test]
    async fn test_records_microseconds() {
        let recorder = CollectingRecorder::default();
        let recorder_ref: &dyn DurationRecorder = &recorder;
        let out = record_ocm_request_duration(Some(recorder_ref), async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            42
        })
        .await;

        assert_eq!(out, 42);
        let observed = recorder.0.lock().unwrap();
        assert_eq!(observed.len(), 1);
        assert!(observed[0] >= 5_000.0, "expected >= 5ms in µs, got {}", observed[0]);
    }

    #[tokio::test]
    async fn test_error_outcome_is_passed_through() {
        let recorder = CollectingRecorder::default();
        let recorder_ref: &dyn DurationRecorder = &recorder;
        let out: Result<(), &str> =
            record_ocm_request_duration(Some(recorder_ref), async { Err("boom") }).await;
        assert_eq!(out, Err("boom"));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_without_recorder_runs_unmetered() {
        let out = record_ocm_request_duration(None, async { "ok" }).await;
        assert_eq!(out, "ok");
    }

    #[test]
    fn test_prometheus_recorder_observes_histogram() {
        let before = OCM_API_REQUEST_DURATION.get_sample_count();
        PrometheusRecorder.record_ocm_api_request(1234.0);
        assert!(OCM_API_REQUEST_DURATION.get_sample_count() > before);
    }

    #[test]
    fn test_counters_accept_labels() {
        increment_reconcile_total("addon", "success");
        observe_reconcile_duration("addon", 0.5);
        increment_upgrade_policy_reports("started");
        assert!(
            UPGRADE_POLICY_REPORTS_TOTAL
                .with_label_values(&["started"])
                .get()
                >= 1
        );
    }
}

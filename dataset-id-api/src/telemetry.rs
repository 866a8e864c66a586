use metrics::{counter, histogram};

pub struct Telemetry;

impl Telemetry {
    /// `outcome` is `ok` or an `UpstreamError::kind` label.
    pub fn record_upstream(outcome: &'static str) {
        counter!("dataset_api_upstream_requests_total", "outcome" => outcome).increment(1);
    }

    pub fn record_aggregation(code: u16, duration_ms: f64) {
        counter!("dataset_api_aggregations_total", "code" => code.to_string()).increment(1);
        histogram!("dataset_api_aggregation_duration_ms").record(duration_ms);
    }
}

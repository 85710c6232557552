//! Prometheus metrics exposition
//!
//! - `gateway_requests_total` (counter): labels `route`, `outcome`
//! - `gateway_remote_errors_total` (counter): labels `operation`, `kind`
//! - `gateway_token_exchanges_total` (counter): labels `grant`, `result`
//! - `gateway_remote_duration_seconds` (histogram): label `operation`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const REMOTE_DURATION: &str = "gateway_remote_duration_seconds";

/// From 5ms up to the longest configurable request timeout.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REMOTE_DURATION.to_string()), DURATION_BUCKETS)
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a finished request to one of the gateway routes.
pub fn record_request(route: &'static str, outcome: &'static str) {
    metrics::counter!("gateway_requests_total", "route" => route, "outcome" => outcome)
        .increment(1);
}

/// Record how long a call to Google took, successful or not.
pub fn record_remote_duration(operation: &'static str, duration_secs: f64) {
    metrics::histogram!(REMOTE_DURATION, "operation" => operation).record(duration_secs);
}

pub fn record_remote_error(operation: &'static str, kind: &'static str) {
    metrics::counter!("gateway_remote_errors_total", "operation" => operation, "kind" => kind)
        .increment(1);
}

/// `grant` is `authorization_code` or `refresh_token`.
pub fn record_token_exchange(grant: &'static str, result: &'static str) {
    metrics::counter!("gateway_token_exchanges_total", "grant" => grant, "result" => result)
        .increment(1);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    /// Recorder/handle pair that doesn't touch the global recorder slot.
    pub(crate) fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = builder()
            .expect("failed to set histogram buckets")
            .build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request("list_files", "ok");
        record_remote_duration("files.list", 0.1);
        record_remote_error("files.list", "http");
        record_token_exchange("authorization_code", "ok");
    }

    #[test]
    fn record_request_carries_route_and_outcome() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("list_files", "ok");
        record_request("list_files", "unauthenticated");

        let output = handle.render();
        assert!(output.contains("gateway_requests_total"));
        assert!(output.contains("route=\"list_files\""));
        assert!(output.contains("outcome=\"ok\""));
        assert!(output.contains("outcome=\"unauthenticated\""));
    }

    #[test]
    fn remote_duration_renders_as_histogram() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_remote_duration("permissions.create", 0.042);

        let output = handle.render();
        assert!(
            output.contains("gateway_remote_duration_seconds_bucket"),
            "histogram must render _bucket lines, got:\n{output}"
        );
    }

    #[test]
    fn error_and_exchange_counters_are_labelled() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_remote_error("files.list", "unauthorized");
        record_token_exchange("refresh_token", "error");

        let output = handle.render();
        assert!(output.contains("gateway_remote_errors_total"));
        assert!(output.contains("kind=\"unauthorized\""));
        assert!(output.contains("gateway_token_exchanges_total"));
        assert!(output.contains("grant=\"refresh_token\""));
        assert!(output.contains("result=\"error\""));
    }
}

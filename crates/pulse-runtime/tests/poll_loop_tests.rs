//! End-to-end tests of the poll loop against mock HTTP servers

use parking_lot::Mutex;
use pulse_core::{metric_names, Error, LoopState};
use pulse_metrics::{MetricsCollector, MetricsSink};
use pulse_runtime::{PollLoop, PollSettings, ShutdownSignal};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that remembers when each metric arrived
#[derive(Debug, Default)]
struct RecordingSink {
    counters: Mutex<Vec<(String, f64, Instant)>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn values(&self, name: &str) -> Vec<f64> {
        self.counters
            .lock()
            .iter()
            .filter(|(n, _, _)| n == name)
            .map(|(_, v, _)| *v)
            .collect()
    }

    fn times(&self, name: &str) -> Vec<Instant> {
        self.counters
            .lock()
            .iter()
            .filter(|(n, _, _)| n == name)
            .map(|(_, _, t)| *t)
            .collect()
    }

    fn total(&self) -> usize {
        self.counters.lock().len()
    }
}

impl MetricsSink for RecordingSink {
    fn increment_counter(&self, name: &str, value: f64) {
        self.counters
            .lock()
            .push((name.to_string(), value, Instant::now()));
    }

    fn report_error(&self, error: &Error) {
        self.errors.lock().push(error.to_string());
    }
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/ok")
}

async fn mock_status(status: u16) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_endpoint_reports_success_and_status() {
    let mock_server = mock_status(200).await;
    let sink = Arc::new(RecordingSink::default());

    let settings = PollSettings::new(
        format!("{}/ok", mock_server.uri()),
        Duration::from_secs(1),
        Duration::from_secs(5),
    );
    let poll_loop = PollLoop::new(settings, sink.clone()).unwrap();

    let signal = ShutdownSignal::new();
    let handle = tokio::spawn(poll_loop.run(signal.token()));

    tokio::time::sleep(Duration::from_millis(3500)).await;
    signal.trigger();
    let report = handle.await.unwrap();

    let successes = sink.values(metric_names::SUCCESS);
    assert!(
        (3..=4).contains(&successes.len()),
        "expected 3-4 successes, got {}",
        successes.len()
    );
    assert!(successes.iter().all(|v| *v == 1.0));

    let statuses = sink.values(metric_names::STATUS_CODE);
    assert_eq!(statuses.len(), successes.len());
    assert!(statuses.iter().all(|v| *v == 200.0));

    assert!(sink.values(metric_names::FAILURE).is_empty());
    assert!(sink.errors.lock().is_empty());
    assert_eq!(report.successes as usize, successes.len());

    // Consecutive probes are at least one interval apart.
    let times = sink.times(metric_names::SUCCESS);
    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(990));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_success_statuses_report_failure() {
    for status in [302u16, 404, 500] {
        let mock_server = mock_status(status).await;
        let collector = Arc::new(MetricsCollector::new());

        let mut settings = PollSettings::new(
            format!("{}/ok", mock_server.uri()),
            Duration::from_secs(60),
            Duration::from_secs(5),
        );
        settings.follow_redirects = false;
        let poll_loop = PollLoop::new(settings, collector.clone()).unwrap();
        let mut state = poll_loop.subscribe();

        let signal = ShutdownSignal::new();
        let handle = tokio::spawn(poll_loop.run(signal.token()));

        state.wait_for(|s| *s == LoopState::Sleeping).await.unwrap();
        signal.trigger();
        handle.await.unwrap();

        assert_eq!(collector.count(metric_names::FAILURE), 1, "status {status}");
        assert_eq!(collector.count(metric_names::SUCCESS), 0, "status {status}");
        assert_eq!(
            collector.last_value(metric_names::STATUS_CODE),
            Some(f64::from(status))
        );
        assert_eq!(collector.total_errors(), 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_closed_port_reports_transport_errors() {
    let sink = Arc::new(RecordingSink::default());

    let settings = PollSettings::new(
        closed_port_url(),
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    let poll_loop = PollLoop::new(settings, sink.clone()).unwrap();

    let signal = ShutdownSignal::new();
    let handle = tokio::spawn(poll_loop.run(signal.token()));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    signal.trigger();
    let report = handle.await.unwrap();

    let exceptions = sink.values(metric_names::EXCEPTION);
    assert!(
        (2..=3).contains(&exceptions.len()),
        "expected 2-3 transport errors, got {}",
        exceptions.len()
    );
    assert_eq!(sink.errors.lock().len(), exceptions.len());
    assert!(sink.values(metric_names::SUCCESS).is_empty());
    assert!(sink.values(metric_names::STATUS_CODE).is_empty());
    assert_eq!(report.transport_errors as usize, exceptions.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_endpoint_times_out_and_loop_continues() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let collector = Arc::new(MetricsCollector::new());
    let settings = PollSettings::new(
        mock_server.uri(),
        Duration::from_millis(100),
        Duration::from_millis(300),
    );
    let poll_loop = PollLoop::new(settings, collector.clone()).unwrap();

    let signal = ShutdownSignal::new();
    let handle = tokio::spawn(poll_loop.run(signal.token()));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    signal.trigger();
    let report = handle.await.unwrap();

    assert!(report.transport_errors >= 2);
    assert_eq!(collector.count(metric_names::EXCEPTION), report.transport_errors);
    assert!(collector
        .recent_errors()
        .iter()
        .all(|e| e.transport && e.message.contains("timed out")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_during_request_skips_sleep_and_metrics() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let settings = PollSettings::new(
        mock_server.uri(),
        Duration::from_secs(60),
        Duration::from_secs(30),
    );
    let poll_loop = PollLoop::new(settings, sink.clone()).unwrap();
    let mut state = poll_loop.subscribe();

    let signal = ShutdownSignal::new();
    let handle = tokio::spawn(poll_loop.run(signal.token()));

    state.wait_for(|s| *s == LoopState::Requesting).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let cancelled_at = Instant::now();
    signal.trigger();
    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop did not stop promptly")
        .unwrap();

    assert!(cancelled_at.elapsed() < Duration::from_secs(2));
    assert_eq!(report.iterations, 0);
    assert_eq!(sink.total(), 0);
    assert!(sink.errors.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_during_sleep_stops_without_new_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let collector = Arc::new(MetricsCollector::new());
    let settings = PollSettings::new(
        format!("{}/ok", mock_server.uri()),
        Duration::from_secs(60),
        Duration::from_secs(5),
    );
    let poll_loop = PollLoop::new(settings, collector.clone()).unwrap();
    let mut state = poll_loop.subscribe();

    let signal = ShutdownSignal::new();
    let handle = tokio::spawn(poll_loop.run(signal.token()));

    state.wait_for(|s| *s == LoopState::Sleeping).await.unwrap();
    signal.trigger();

    let report = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop did not stop promptly")
        .unwrap();

    assert_eq!(report.iterations, 1);
    assert_eq!(collector.count(metric_names::SUCCESS), 1);
    assert_eq!(*state.borrow(), LoopState::Stopped);
    mock_server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_double_cancellation_matches_single() {
    let mock_server = mock_status(200).await;

    let mut reports = Vec::new();
    for triggers in [1, 2] {
        let collector = Arc::new(MetricsCollector::new());
        let settings = PollSettings::new(
            format!("{}/ok", mock_server.uri()),
            Duration::from_secs(60),
            Duration::from_secs(5),
        );
        let poll_loop = PollLoop::new(settings, collector.clone()).unwrap();
        let mut state = poll_loop.subscribe();

        let signal = ShutdownSignal::new();
        let handle = tokio::spawn(poll_loop.run(signal.token()));

        state.wait_for(|s| *s == LoopState::Sleeping).await.unwrap();
        for _ in 0..triggers {
            signal.trigger();
        }

        let report = handle.await.unwrap();
        assert!(signal.is_triggered());
        reports.push((report, collector.count(metric_names::SUCCESS)));
    }

    assert_eq!(reports[0], reports[1]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_url_is_unexpected_error_and_loop_survives() {
    let collector = Arc::new(MetricsCollector::new());
    let settings = PollSettings::new(
        "http://",
        Duration::from_millis(100),
        Duration::from_secs(1),
    );
    let poll_loop = PollLoop::new(settings, collector.clone()).unwrap();

    let signal = ShutdownSignal::new();
    let handle = tokio::spawn(poll_loop.run(signal.token()));

    tokio::time::sleep(Duration::from_millis(350)).await;
    signal.trigger();
    let report = handle.await.unwrap();

    assert!(report.unexpected_errors >= 2);
    assert_eq!(collector.count(metric_names::UNEXPECTED_ERROR), report.unexpected_errors);
    assert_eq!(collector.total_errors(), report.unexpected_errors);
    assert_eq!(collector.count(metric_names::EXCEPTION), 0);
}

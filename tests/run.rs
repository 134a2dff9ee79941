mod common;

use std::time::{Duration, Instant};

use common::{refused_url, TestServer};
use pt::{run_until, LoadConfig};

const BODY: &[u8] = b"0123456789";

fn config(url: &str, concurrency: usize, cap: u64, timeout: Duration) -> LoadConfig {
    LoadConfig::new(url)
        .unwrap()
        .with_concurrency(concurrency)
        .unwrap()
        .with_timeout(timeout)
        .unwrap()
        .with_total_cap(cap)
        .with_report_interval(Duration::from_millis(100))
}

async fn never() {
    futures::future::pending::<()>().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_run_issues_exactly_the_budget() {
    let server = TestServer::start(Duration::from_millis(50), BODY).await;
    let config = config(&server.url(), 4, 20, Duration::from_secs(1));

    let summary = tokio::time::timeout(Duration::from_secs(10), run_until(config, never()))
        .await
        .expect("bounded run should terminate")
        .unwrap();

    assert_eq!(summary.issued, Some(20));
    assert_eq!(summary.total_requests, 20);
    assert_eq!(summary.total_200, 20);
    assert_eq!(summary.total_errors, 0);
    assert_eq!(summary.total_bytes, 20 * BODY.len() as u64);
    assert!((summary.success_pct() - 100.0).abs() < 1e-9);
    assert!(summary.windows >= 1);
    assert!(summary.min_time.unwrap() >= Duration::from_millis(50));
    assert_eq!(server.hits(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn keep_alive_run_completes_the_budget() {
    let server = TestServer::start(Duration::from_millis(5), BODY).await;
    let config = config(&server.url(), 3, 12, Duration::from_secs(1)).with_keep_alive(true);

    let summary = tokio::time::timeout(Duration::from_secs(10), run_until(config, never()))
        .await
        .expect("bounded run should terminate")
        .unwrap();

    assert_eq!(summary.total_requests, 12);
    assert_eq!(summary.total_200, 12);
    assert_eq!(server.hits(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refused_connections_are_recorded_as_errors() {
    let url = refused_url().await;
    let config = config(&url, 2, 10, Duration::from_secs(1));

    let summary = tokio::time::timeout(Duration::from_secs(10), run_until(config, never()))
        .await
        .expect("bounded run should terminate")
        .unwrap();

    assert_eq!(summary.issued, Some(10));
    assert_eq!(summary.total_requests, 10);
    assert_eq!(summary.total_200, 0);
    assert_eq!(summary.total_errors, 10);
    assert_eq!(summary.total_bytes, 0);
    assert_eq!(summary.success_pct(), 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unbounded_run_reports_until_shutdown() {
    let server = TestServer::start(Duration::from_millis(20), BODY).await;
    let config = config(&server.url(), 2, 0, Duration::from_secs(1));

    let summary = run_until(config, tokio::time::sleep(Duration::from_millis(600)))
        .await
        .unwrap();

    assert_eq!(summary.issued, None);
    assert!(summary.total_requests > 0);
    assert!(summary.windows >= 1);
    assert_eq!(summary.total_200, summary.total_requests);
    // 被取消的在途请求不计入统计
    assert!(server.hits() as u64 >= summary.total_requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_aborts_in_flight_requests() {
    let server = TestServer::start(Duration::from_secs(10), BODY).await;
    let config = config(&server.url(), 3, 0, Duration::from_secs(30));

    let started = Instant::now();
    let summary = run_until(config, tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.total_requests, 0);
    assert_eq!(summary.windows, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_responses_hit_the_request_timeout() {
    let server = TestServer::start(Duration::from_secs(5), BODY).await;
    let config = config(&server.url(), 2, 4, Duration::from_millis(200));

    let summary = tokio::time::timeout(Duration::from_secs(10), run_until(config, never()))
        .await
        .expect("timeouts should bound the run")
        .unwrap();

    assert_eq!(summary.total_requests, 4);
    assert_eq!(summary.total_errors, 4);
    assert!(summary.min_time.unwrap() >= Duration::from_millis(200));
}

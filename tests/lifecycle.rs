//! End-to-end lifecycle tests through the public API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use request_connection::{
    Connection, ConnectionState, Error, EventKind, HttpRequest, HttpRequestBuilder,
    ManualScheduler, Method, RequestOptions, ResponseBody, SimulatedTransport, TokioScheduler,
    Transport, listener,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Helpers
// ============================================================================

type Log = Arc<Mutex<Vec<(EventKind, ConnectionState)>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn recording_builder(url: &str, log: &Log) -> HttpRequestBuilder {
    let mut builder = HttpRequestBuilder::new(url);
    for kind in EventKind::ALL {
        let log = Arc::clone(log);
        builder = builder.on(
            kind,
            listener(move |event| {
                let state = event
                    .source()
                    .map_or(ConnectionState::Closed, |source| source.state());
                log.lock().push((event.kind(), state));
            }),
        );
    }
    builder
}

fn kinds(log: &Log) -> Vec<EventKind> {
    log.lock().iter().map(|(kind, _)| *kind).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn successful_get_reports_open_then_complete() {
    init_tracing();
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let log = Log::default();

    let request = recording_builder("https://api.example.com/items/7", &log)
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    request.open().expect("open");
    assert_eq!(request.state(), ConnectionState::Open);
    assert!(request.opened().is_some());
    assert!(log.lock().is_empty());

    transport.complete(200, r#"{"id":7,"name":"widget"}"#);
    assert_eq!(request.state(), ConnectionState::Closed);

    scheduler.run_until_idle();
    assert_eq!(
        *log.lock(),
        vec![
            (EventKind::Open, ConnectionState::Closed),
            (EventKind::Complete, ConnectionState::Closed),
        ]
    );
    assert_eq!(request.status(), 200);
    assert_eq!(
        request.response().expect("decoded"),
        ResponseBody::Json(json!({"id": 7, "name": "widget"}))
    );
    assert!(request.closed() >= request.opened());
}

#[test]
fn server_error_reports_error_event() {
    init_tracing();
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let log = Log::default();

    let request = recording_builder("https://api.example.com/missing", &log)
        .open_immediately()
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    scheduler.run_until_idle();
    transport.complete(404, r#"{"error":"not found"}"#);
    scheduler.run_until_idle();

    assert_eq!(kinds(&log), vec![EventKind::Open, EventKind::Error]);
    assert_eq!(request.state(), ConnectionState::Closed);
    assert_eq!(request.status(), 404);
}

#[test]
fn progress_reports_data_while_open() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let log = Log::default();

    let request = recording_builder("https://api.example.com/stream", &log)
        .open_immediately()
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    transport.progress();
    transport.progress();
    scheduler.run_until_idle();

    assert_eq!(
        *log.lock(),
        vec![
            (EventKind::Open, ConnectionState::Open),
            (EventKind::Data, ConnectionState::Open),
            (EventKind::Data, ConnectionState::Open),
        ]
    );
    assert_eq!(request.state(), ConnectionState::Open);
}

#[test]
fn data_listeners_fire_in_registration_order_per_signal() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&calls);
    let second = Arc::clone(&calls);
    let request = HttpRequestBuilder::new("https://api.example.com/stream")
        .on(EventKind::Data, listener(move |_| first.lock().push("a")))
        .on(EventKind::Data, listener(move |_| second.lock().push("b")))
        .open_immediately()
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    transport.progress();
    transport.progress();
    scheduler.run_until_idle();

    assert_eq!(*calls.lock(), vec!["a", "b", "a", "b"]);
    assert_eq!(request.state(), ConnectionState::Open);
}

#[test]
fn timeout_closes_with_error() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let log = Log::default();

    let request = recording_builder("https://api.example.com/slow", &log)
        .timeout(250)
        .open_immediately()
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    assert_eq!(transport.timeout(), Duration::from_millis(250));

    transport.time_out();
    scheduler.run_until_idle();

    assert_eq!(kinds(&log), vec![EventKind::Open, EventKind::Error]);
    assert_eq!(request.state(), ConnectionState::Closed);
}

#[test]
fn close_before_open_aborts_without_transport_activity() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let log = Log::default();

    let request = recording_builder("https://api.example.com/", &log)
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    request.close().expect("close");
    request.close().expect("second close");
    request.open().expect("open after close");
    scheduler.run_until_idle();

    assert_eq!(kinds(&log), vec![EventKind::Abort]);
    assert_eq!(request.state(), ConnectionState::Closed);
    assert!(request.opened().is_none());
    assert!(request.closed().is_some());
    assert_eq!(transport.send_count(), 0);
    assert_eq!(transport.abort_count(), 0);
}

#[test]
fn close_while_open_aborts_transport() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();
    let log = Log::default();

    let request = recording_builder("https://api.example.com/", &log)
        .open_immediately()
        .scheduler(scheduler.clone())
        .build(transport.clone())
        .expect("valid request");

    request.close().expect("close");
    scheduler.run_until_idle();

    assert_eq!(transport.abort_count(), 1);
    assert_eq!(kinds(&log), vec![EventKind::Open, EventKind::Abort]);
    assert_eq!(request.state(), ConnectionState::Closed);
}

#[test]
fn post_sends_body_and_headers() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new();

    let options = RequestOptions::from_json(
        r#"{
            "method": "POST",
            "body": "{\"name\":\"widget\"}",
            "headers": {"Accept": "application/json", "X-Retry": 2, "X-Skip": null},
            "responseType": "text",
            "open": true
        }"#,
    )
    .expect("well-formed options");

    let request = HttpRequest::new(
        "https://api.example.com/items",
        options,
        scheduler.clone(),
        || transport.clone(),
    )
    .expect("valid request");

    let (method, url) = transport.request().expect("opened");
    assert_eq!(method, Method::Post);
    assert_eq!(url.as_str(), "https://api.example.com/items");
    assert_eq!(
        transport.headers(),
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Retry".to_string(), "2".to_string()),
        ]
    );
    assert!(transport.sent_body().is_some());

    transport.complete(201, "created");
    assert_eq!(
        request.response().expect("text"),
        ResponseBody::Text("created".to_string())
    );
}

#[test]
fn json_fallback_parses_text_response() {
    let scheduler = Arc::new(ManualScheduler::new());
    let transport = SimulatedTransport::new().with_json_fallback();

    let request = HttpRequestBuilder::new("https://api.example.com/legacy")
        .open_immediately()
        .scheduler(scheduler)
        .build(transport.clone())
        .expect("valid request");

    assert_eq!(transport.response_type(), None);

    transport.complete(200, r#"[1, 2, 3]"#);
    assert_eq!(
        request.response().expect("parsed"),
        ResponseBody::Json(json!([1, 2, 3]))
    );
}

#[test]
fn invalid_options_are_rejected() {
    let scheduler = Arc::new(ManualScheduler::new());

    let cases = [
        RequestOptions::new().with_method("PATCH"),
        RequestOptions::new().with_response_type("xml"),
        RequestOptions::new().with_timeout(-1),
        RequestOptions::new().with_headers(json!(["Accept"])),
        RequestOptions::new().with_listener("finish", listener(|_| {})),
    ];

    for options in cases {
        let result = HttpRequest::new(
            "https://api.example.com/",
            options,
            scheduler.clone(),
            SimulatedTransport::new,
        );
        assert!(
            matches!(result, Err(Error::InvalidConfiguration { .. })),
            "expected configuration error"
        );
    }
}

// ============================================================================
// Runtime Scheduler
// ============================================================================

#[tokio::test]
async fn tokio_scheduler_delivers_events_in_order() {
    init_tracing();
    let transport = SimulatedTransport::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let mut builder = HttpRequestBuilder::new("https://api.example.com/items");
    for kind in EventKind::ALL {
        let tx = tx.clone();
        builder = builder.on(
            kind,
            listener(move |event| {
                let _ = tx.send(event.kind());
            }),
        );
    }

    let request = builder
        .scheduler(Arc::new(TokioScheduler::new().expect("runtime")))
        .build(transport.clone())
        .expect("valid request");

    request.open().expect("open");
    transport.progress();
    transport.complete(200, "{}");

    let mut received = Vec::new();
    while received.len() < 3 {
        let kind = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event delivered")
            .expect("channel open");
        received.push(kind);
    }

    assert_eq!(
        received,
        vec![EventKind::Open, EventKind::Data, EventKind::Complete]
    );
    assert_eq!(request.state(), ConnectionState::Closed);
}

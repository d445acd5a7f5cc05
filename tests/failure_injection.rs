//! Failure injection against a real HTTP catalog.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use inventory_gate::config::ValidationPolicy;
use inventory_gate::gate::{CallerContext, ErrorKind, ValidationRequest, Verdict};
use inventory_gate::inventory::{InventoryAuthority, LookupError};
use inventory_gate::observability::AttemptResult;
use inventory_gate::resilience::CircuitState;

mod common;
use common::MockResponse;

fn request(product_id: &str, qty: u32) -> ValidationRequest {
    ValidationRequest::new(product_id, qty, CallerContext::new()).unwrap()
}

#[tokio::test]
async fn test_http_lookup_admits_and_rejects() {
    let (addr, calls) =
        common::start_programmable_catalog(|_| async { MockResponse::product("P1", 3) }).await;
    let (gate, _) = common::orchestrator(
        Arc::new(common::http_client(addr)),
        ValidationPolicy::default(),
        true,
    );

    assert_eq!(
        gate.validate(&request("P1", 3)).await,
        Verdict::Admit { degraded: false }
    );

    let verdict = gate.validate(&request("P1", 5)).await;
    let message = verdict.into_result().unwrap_err().to_string();
    assert!(message.contains("P1") && message.contains('5') && message.contains('3'));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_fails_open() {
    let (addr, calls) = common::start_programmable_catalog(|_| async {
        MockResponse::product("P1", 100).delayed(Duration::from_millis(2_000))
    })
    .await;
    let policy = ValidationPolicy {
        timeout_ms: 500,
        fail_open: true,
        ..ValidationPolicy::default()
    };
    let (gate, sink) = common::orchestrator(Arc::new(common::http_client(addr)), policy, true);

    let started = Instant::now();
    let evaluation = gate.evaluate(&request("P1", 1)).await;
    let elapsed = started.elapsed();

    assert_eq!(evaluation.verdict, Verdict::Admit { degraded: true });
    assert_eq!(evaluation.result.error_kind(), Some(ErrorKind::Timeout));
    assert!(evaluation.result.validation_performed());
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(1_500), "gate waited {elapsed:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "timeouts are never retried");

    let span = sink.last_span().unwrap();
    assert_eq!(span.result, AttemptResult::Error);
    assert_eq!(span.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(sink.degraded(), vec![ErrorKind::Timeout]);
}

#[tokio::test]
async fn test_transient_503_retried_once() {
    let (addr, calls) = common::start_programmable_catalog(|index| async move {
        if index == 0 {
            MockResponse::status(503)
        } else {
            MockResponse::product("P1", 4)
        }
    })
    .await;
    let (gate, _) = common::orchestrator(
        Arc::new(common::http_client(addr)),
        ValidationPolicy::default(),
        true,
    );

    let evaluation = gate.evaluate(&request("P1", 4)).await;
    assert_eq!(evaluation.verdict, Verdict::Admit { degraded: false });
    assert_eq!(evaluation.result.attempts(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_persistent_503_gives_up_after_one_retry() {
    let (addr, calls) =
        common::start_programmable_catalog(|_| async { MockResponse::status(503) }).await;
    let (gate, _) = common::orchestrator(
        Arc::new(common::http_client(addr)),
        ValidationPolicy::default(),
        true,
    );

    let evaluation = gate.evaluate(&request("P1", 1)).await;
    assert_eq!(evaluation.result.error_kind(), Some(ErrorKind::Unavailable));
    assert_eq!(evaluation.verdict, Verdict::Admit { degraded: true });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let (addr, calls) = common::start_programmable_catalog(|index| async move {
        match index {
            0 => MockResponse::raw("{not json"),
            _ => MockResponse::raw(r#"{"id": "P1", "name": "no stock field"}"#),
        }
    })
    .await;
    let policy = ValidationPolicy {
        fail_open: false,
        ..ValidationPolicy::default()
    };
    let (gate, _) = common::orchestrator(Arc::new(common::http_client(addr)), policy, true);

    for _ in 0..2 {
        let evaluation = gate.evaluate(&request("P1", 1)).await;
        assert_eq!(evaluation.result.error_kind(), Some(ErrorKind::InvalidResponse));
        assert_eq!(evaluation.verdict, Verdict::RejectSystem);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2, "parse errors are never retried");
}

#[tokio::test]
async fn test_unknown_product_is_not_transient() {
    let (addr, calls) =
        common::start_programmable_catalog(|_| async { MockResponse::status(404) }).await;
    let client = common::http_client(addr);

    let err = client.lookup("missing").await.unwrap_err();
    assert_eq!(err, LookupError::NotFound("missing".into()));
    assert!(!err.is_transient());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refused_connection_is_transient() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let err = common::http_client(addr).lookup("P1").await.unwrap_err();
    assert!(matches!(err, LookupError::Connect(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_breaker_stops_calling_failing_catalog() {
    let (addr, calls) =
        common::start_programmable_catalog(|_| async { MockResponse::status(500) }).await;
    let policy = ValidationPolicy {
        failure_threshold: 3,
        minimum_throughput: 3,
        break_duration_ms: 60_000,
        ..ValidationPolicy::default()
    };
    let (gate, sink) = common::orchestrator(Arc::new(common::http_client(addr)), policy, true);

    for _ in 0..10 {
        assert!(gate.validate(&request("P1", 1)).await.is_admit());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(gate.breaker().state(), CircuitState::Open);
    assert_eq!(sink.result_count(AttemptResult::Error), 3);
    assert_eq!(sink.result_count(AttemptResult::Bypassed), 7);
}

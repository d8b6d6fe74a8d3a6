//! Integration tests for security evaluation
//!
//! # Test Coverage
//!
//! - OR-of-AND group semantics and evaluation order
//! - Per-evaluation memoisation of (scheme, scopes) results
//! - Denial selection when no group passes
//! - Cancellation while a callback is pending
//! - The built-in `ApiKeyCallback` for header, query and cookie schemes

mod common;

use async_trait::async_trait;
use brrtbind::security::{
    from_fn, ApiKeyCallback, Cancelled, Denial, SecurityCallback, SecurityEvaluator,
    SecurityOutcome, SecurityRequest,
};
use brrtbind::server::RawRequest;
use brrtbind::spec::{RouteMeta, SecurityGroup, SecurityRequirement};
use http::Method;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Callback with a fixed answer that counts its invocations.
struct Counting {
    result: Result<(), Denial>,
    calls: Arc<AtomicUsize>,
}

impl Counting {
    fn pass(calls: &Arc<AtomicUsize>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(()),
            calls: Arc::clone(calls),
        })
    }

    fn deny(denial: Denial, calls: &Arc<AtomicUsize>) -> Arc<Self> {
        Arc::new(Self {
            result: Err(denial),
            calls: Arc::clone(calls),
        })
    }
}

#[async_trait]
impl SecurityCallback for Counting {
    async fn check(
        &self,
        _request: &SecurityRequest<'_>,
        _scheme: &Value,
        _scopes: &[String],
    ) -> Result<(), Denial> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Callback that only answers after a long delay.
struct Slow;

#[async_trait]
impl SecurityCallback for Slow {
    async fn check(
        &self,
        _request: &SecurityRequest<'_>,
        _scheme: &Value,
        _scopes: &[String],
    ) -> Result<(), Denial> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

fn schemes(names: &[&str]) -> Map<String, Value> {
    names
        .iter()
        .map(|n| (n.to_string(), json!({ "type": "http", "scheme": "bearer" })))
        .collect()
}

fn requirement(scheme: &str) -> SecurityRequirement {
    SecurityRequirement {
        scheme: scheme.to_string(),
        scopes: Vec::new(),
    }
}

fn groups(spec: &[&[&str]]) -> Vec<SecurityGroup> {
    spec.iter()
        .map(|group| group.iter().map(|s| requirement(s)).collect())
        .collect()
}

fn route() -> RouteMeta {
    let loaded = common::load_pets();
    loaded
        .routes
        .iter()
        .find(|r| r.name == "deletePet")
        .unwrap()
        .clone()
}

#[tokio::test]
async fn test_second_group_allows_when_first_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = SecurityEvaluator::new(schemes(&["A", "B", "C"]))
        .with_callback("A", Counting::deny(Denial::unauthorized("A says no."), &calls))
        .with_callback("B", Counting::pass(&calls))
        .with_callback("C", Counting::pass(&calls));

    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let outcome = evaluator
        .evaluate(
            &groups(&[&["A", "B"], &["C"]]),
            &SecurityRequest::new(&request, &route),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, SecurityOutcome::Allowed);
    // B is skipped once A fails its group
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_first_passing_group_stops_evaluation() {
    let later = Arc::new(AtomicUsize::new(0));
    let first = Arc::new(AtomicUsize::new(0));
    let evaluator = SecurityEvaluator::new(schemes(&["A", "B"]))
        .with_callback("A", Counting::pass(&first))
        .with_callback("B", Counting::pass(&later));

    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let outcome = evaluator
        .evaluate(
            &groups(&[&["A"], &["B"]]),
            &SecurityRequest::new(&request, &route),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(outcome.is_allowed());
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_results_are_memoised_within_one_evaluation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = SecurityEvaluator::new(schemes(&["A", "B", "C"]))
        .with_callback("A", Counting::deny(Denial::unauthorized("no"), &calls))
        .with_callback("B", Counting::pass(&calls))
        .with_callback("C", Counting::pass(&calls));

    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let outcome = evaluator
        .evaluate(
            &groups(&[&["A"], &["B", "A"], &["A", "C"]]),
            &SecurityRequest::new(&request, &route),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(!outcome.is_allowed());
    // A once, B once, C never
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // a new evaluation starts with an empty memo
    evaluator
        .evaluate(
            &groups(&[&["A"]]),
            &SecurityRequest::new(&request, &route),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_last_denial_is_reported() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = SecurityEvaluator::new(schemes(&["A", "B"]))
        .with_callback("A", Counting::deny(Denial::unauthorized("Token missing."), &calls))
        .with_callback("B", Counting::deny(Denial::forbidden("Scope missing."), &calls));

    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let outcome = evaluator
        .evaluate(
            &groups(&[&["A"], &["B"]]),
            &SecurityRequest::new(&request, &route),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    match outcome {
        SecurityOutcome::Denied(denial) => {
            assert_eq!(denial.status, 403);
            assert_eq!(denial.message, "Scope missing.");
            assert_eq!(denial.scheme.as_deref(), Some("B"));
        }
        SecurityOutcome::Allowed => panic!("expected a denial"),
    }
}

#[tokio::test]
async fn test_empty_requirements_allow() {
    let evaluator = SecurityEvaluator::default();
    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let outcome = evaluator
        .evaluate(&[], &SecurityRequest::new(&request, &route), &CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.is_allowed());
}

#[tokio::test]
async fn test_scheme_without_callback_is_denied() {
    let evaluator = SecurityEvaluator::new(schemes(&["A"]));
    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let outcome = evaluator
        .evaluate(
            &groups(&[&["A"]]),
            &SecurityRequest::new(&request, &route),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SecurityOutcome::Denied(Denial {
            status: 401,
            message: "No security callback for A.".to_string(),
            scheme: Some("A".to_string()),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_abandons_pending_callback() {
    let evaluator = SecurityEvaluator::new(schemes(&["slow"])).with_callback("slow", Arc::new(Slow));
    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let result = evaluator
        .evaluate(
            &groups(&[&["slow"]]),
            &SecurityRequest::new(&request, &route),
            &cancel,
        )
        .await;
    assert_eq!(result, Err(Cancelled));
}

#[tokio::test]
async fn test_already_cancelled_request_never_calls_back() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator =
        SecurityEvaluator::new(schemes(&["A"])).with_callback("A", Counting::pass(&calls));
    let request = RawRequest::new(Method::GET, "/");
    let route = route();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = evaluator
        .evaluate(&groups(&[&["A"]]), &SecurityRequest::new(&request, &route), &cancel)
        .await;
    assert_eq!(result, Err(Cancelled));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_closure_callbacks_see_request_and_scopes() {
    let evaluator = SecurityEvaluator::new(schemes(&["oauth"])).with_callback(
        "oauth",
        Arc::new(from_fn(|req, _scheme, scopes| {
            match (req.get_header("authorization"), scopes) {
                (Some("Bearer admin"), _) => Ok(()),
                (Some(_), [scope]) if scope == "read" => Ok(()),
                (Some(_), _) => Err(Denial::forbidden("Insufficient scope.")),
                (None, _) => Err(Denial::unauthorized("Missing token.")),
            }
        })),
    );
    let route = route();
    let read = vec![vec![SecurityRequirement {
        scheme: "oauth".to_string(),
        scopes: vec!["read".to_string()],
    }]];
    let write = vec![vec![SecurityRequirement {
        scheme: "oauth".to_string(),
        scopes: vec!["write".to_string()],
    }]];

    let user = RawRequest::new(Method::GET, "/").with_header("Authorization", "Bearer user");
    let cancel = CancellationToken::new();
    let ctx = SecurityRequest::new(&user, &route);
    assert!(evaluator.evaluate(&read, &ctx, &cancel).await.unwrap().is_allowed());
    assert_eq!(
        evaluator.evaluate(&write, &ctx, &cancel).await.unwrap(),
        SecurityOutcome::Denied(Denial {
            status: 403,
            message: "Insufficient scope.".to_string(),
            scheme: Some("oauth".to_string()),
        })
    );
}

#[tokio::test]
async fn test_api_key_callback_locations() {
    let mut registry = Map::new();
    registry.insert(
        "header".to_string(),
        json!({ "type": "apiKey", "in": "header", "name": "X-Api-Key" }),
    );
    registry.insert(
        "query".to_string(),
        json!({ "type": "apiKey", "in": "query", "name": "api_key" }),
    );
    registry.insert(
        "cookie".to_string(),
        json!({ "type": "apiKey", "in": "cookie", "name": "session" }),
    );
    let keys: Arc<dyn SecurityCallback> = Arc::new(ApiKeyCallback::new("s3cret").with_key("rotated"));
    let evaluator = SecurityEvaluator::new(registry)
        .with_callback("header", Arc::clone(&keys))
        .with_callback("query", Arc::clone(&keys))
        .with_callback("cookie", keys);
    let route = route();
    let cancel = CancellationToken::new();

    let check = |request: RawRequest, scheme: &'static str| {
        let evaluator = evaluator.clone();
        let route = route.clone();
        let cancel = cancel.clone();
        async move {
            evaluator
                .evaluate(
                    &groups(&[&[scheme]]),
                    &SecurityRequest::new(&request, &route),
                    &cancel,
                )
                .await
                .unwrap()
        }
    };

    let by_header = RawRequest::new(Method::GET, "/").with_header("x-api-key", "s3cret");
    assert!(check(by_header, "header").await.is_allowed());

    let by_query = RawRequest::new(Method::GET, "/?api_key=rotated");
    assert!(check(by_query, "query").await.is_allowed());

    let by_cookie = RawRequest::new(Method::GET, "/").with_header("Cookie", "session=s3cret");
    assert!(check(by_cookie, "cookie").await.is_allowed());

    let wrong = RawRequest::new(Method::GET, "/").with_header("X-Api-Key", "guess");
    match check(wrong, "header").await {
        SecurityOutcome::Denied(d) => assert_eq!(d.message, "Invalid API key."),
        SecurityOutcome::Allowed => panic!("wrong key allowed"),
    }

    match check(RawRequest::new(Method::GET, "/"), "header").await {
        SecurityOutcome::Denied(d) => {
            assert_eq!(d.status, 401);
            assert_eq!(d.message, "Missing API key.");
        }
        SecurityOutcome::Allowed => panic!("missing key allowed"),
    }
}

//! Tests for the `Transport` pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use super::{
    BearerAdapter, HttpClient, HttpError, HttpRequest, HttpResponse, NoopAdapter, RetryPolicy,
    SharedToken, StaticToken, TokenSource, Transport, TransportError,
};
use crate::dispatch::main_context;
use crate::router::{Method, RegisterRequest, RequestDescriptor, Route};
use crate::time::{InstantSleeper, TokioSleeper};

const BASE: &str = "https://api.example.com";

/// Mock HTTP client that returns a configurable sequence of responses.
#[derive(Debug)]
struct MockClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
}

impl MockClient {
    fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    fn statuses(codes: &[u16], success_body: &str) -> Self {
        Self::new(
            codes
                .iter()
                .map(|&code| {
                    let status = StatusCode::from_u16(code).unwrap();
                    let body = if status.is_success() {
                        success_body.as_bytes().to_vec()
                    } else {
                        b"server says no".to_vec()
                    };
                    Ok(HttpResponse::new(status, http::HeaderMap::new(), body))
                })
                .collect(),
        )
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req);
        self.responses.lock().unwrap().remove(0)
    }
}

/// Client that never answers.
struct StalledClient;

impl HttpClient for StalledClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
        std::future::pending().await
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Registered {
    id: u64,
}

fn transport(client: MockClient, retry: RetryPolicy) -> Transport<MockClient, InstantSleeper> {
    Transport::from_parts(client, InstantSleeper, Arc::new(NoopAdapter), retry)
}

fn register_descriptor() -> RequestDescriptor {
    Route::Register(RegisterRequest::new("alice", "s3cret")).descriptor(BASE)
}

mod send {
    use super::*;

    #[tokio::test]
    async fn decodes_success_body() {
        let t = transport(MockClient::statuses(&[200], r#"{"id":7}"#), RetryPolicy::new());

        let result: Registered = t.send(&register_descriptor()).await.unwrap();

        assert_eq!(result, Registered { id: 7 });
        assert_eq!(t.client().calls(), 1);
    }

    #[tokio::test]
    async fn transmits_descriptor_as_built() {
        let t = transport(MockClient::statuses(&[200], "{}"), RetryPolicy::new());

        let _: serde_json::Value = t.send(&register_descriptor()).await.unwrap();

        let sent = &t.client().captured_requests()[0];
        assert_eq!(sent.method, http::Method::POST);
        assert_eq!(
            sent.url.as_str(),
            "https://api.example.com/api/v1/authentication/register"
        );
        let body: serde_json::Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"username": "alice", "password": "s3cret"}));
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let t = transport(
            MockClient::statuses(&[500, 500, 200], r#"{"id":1}"#),
            RetryPolicy::new().with_limit(2),
        );

        let result: Registered = t.send(&register_descriptor()).await.unwrap();

        assert_eq!(result.id, 1);
        assert_eq!(t.client().calls(), 3);
    }

    #[tokio::test]
    async fn every_attempt_carries_the_same_request() {
        let t = transport(
            MockClient::statuses(&[503, 200], "{}"),
            RetryPolicy::new().with_delay(Duration::ZERO),
        );

        let _: serde_json::Value = t.send(&register_descriptor()).await.unwrap();

        let sent = t.client().captured_requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[tokio::test]
    async fn reports_exhaustion_with_last_error() {
        let t = transport(
            MockClient::statuses(&[500, 502, 503], "{}"),
            RetryPolicy::new().with_limit(2),
        );

        let err = t
            .send::<serde_json::Value>(&register_descriptor())
            .await
            .unwrap_err();

        match err {
            TransportError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(t.client().calls(), 3);
    }

    #[tokio::test]
    async fn zero_limit_returns_raw_validation_error() {
        let t = transport(MockClient::statuses(&[404], "{}"), RetryPolicy::none());

        let err = t
            .send::<serde_json::Value>(&register_descriptor())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransportError::Validation { status, ref body }
                if status == StatusCode::NOT_FOUND && body.as_deref() == Some("server says no")
        ));
        assert_eq!(t.client().calls(), 1);
    }

    #[tokio::test]
    async fn connection_failure_is_not_retried() {
        let client = MockClient::new(vec![
            Err(HttpError::Timeout),
            Ok(HttpResponse::new(StatusCode::OK, http::HeaderMap::new(), b"{}".to_vec())),
        ]);
        let t = transport(client, RetryPolicy::new());

        let err = t
            .send::<serde_json::Value>(&register_descriptor())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Transport(HttpError::Timeout)));
        assert_eq!(t.client().calls(), 1);
    }

    #[tokio::test]
    async fn decoding_failure_is_not_retried() {
        let t = transport(
            MockClient::statuses(&[200, 200], "not json"),
            RetryPolicy::new(),
        );

        let err = t.send::<Registered>(&register_descriptor()).await.unwrap_err();

        assert!(matches!(err, TransportError::Decoding(_)));
        assert_eq!(t.client().calls(), 1);
    }

    #[tokio::test]
    async fn invalid_url_fails_without_transmitting() {
        let t = transport(MockClient::new(vec![]), RetryPolicy::new());
        let descriptor = RequestDescriptor::new(Method::Get, "not a url", "/x");

        let err = t.send::<serde_json::Value>(&descriptor).await.unwrap_err();

        assert!(matches!(err, TransportError::InvalidUrl(_)));
        assert_eq!(t.client().calls(), 0);
    }
}

mod adapter {
    use super::*;

    /// Client that swaps the shared token after the first attempt.
    struct RotatingClient {
        inner: MockClient,
        token: SharedToken,
    }

    impl HttpClient for RotatingClient {
        async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
            let response = self.inner.request(req).await;
            self.token.set(Some("fresh".to_string()));
            response
        }
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let t = Transport::from_parts(
            MockClient::statuses(&[200], "{}"),
            InstantSleeper,
            Arc::new(BearerAdapter::new(StaticToken::new("abc"))),
            RetryPolicy::new(),
        );

        let _: serde_json::Value = t.send(&register_descriptor()).await.unwrap();

        let sent = &t.client().captured_requests()[0];
        assert_eq!(sent.headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[tokio::test]
    async fn retry_sees_refreshed_token() {
        let token = SharedToken::new();
        token.set(Some("stale".to_string()));
        let client = RotatingClient {
            inner: MockClient::statuses(&[401, 200], "{}"),
            token: token.clone(),
        };
        let t = Transport::from_parts(
            client,
            InstantSleeper,
            Arc::new(BearerAdapter::new(token)),
            RetryPolicy::new(),
        );

        let _: serde_json::Value = t.send(&register_descriptor()).await.unwrap();

        let sent = t.client().inner.captured_requests();
        assert_eq!(sent[0].headers.get(AUTHORIZATION).unwrap(), "Bearer stale");
        assert_eq!(sent[1].headers.get(AUTHORIZATION).unwrap(), "Bearer fresh");
    }
}

mod upload {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

    fn progress_log() -> (Arc<Mutex<Vec<f64>>>, impl Fn(f64) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        (seen, move |f| s.lock().unwrap().push(f))
    }

    #[tokio::test]
    async fn sends_sniffed_file_part() {
        let t = transport(MockClient::statuses(&[200], r#"{"id":3}"#), RetryPolicy::new());
        let (_, on_progress) = progress_log();

        let result: Registered = t
            .upload(&register_descriptor(), Some(PNG.to_vec()), "avatar", on_progress)
            .await
            .unwrap();

        assert_eq!(result.id, 3);
        let sent = &t.client().captured_requests()[0];
        let content_type = sent.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8_lossy(sent.body.as_ref().unwrap());
        assert!(body.contains("name=\"avatar\"; filename=\"avatar\""));
        assert!(body.contains("Content-Type: image/png"));
    }

    #[tokio::test]
    async fn empty_file_sends_empty_body_and_reports_progress() {
        let t = transport(MockClient::statuses(&[200], "{}"), RetryPolicy::new());
        let (seen, on_progress) = progress_log();

        let _: serde_json::Value = t
            .upload(&register_descriptor(), Some(Vec::new()), "avatar", on_progress)
            .await
            .unwrap();

        assert_eq!(t.client().captured_requests()[0].body_len(), 0);
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    #[tokio::test]
    async fn missing_file_sends_empty_body() {
        let t = transport(MockClient::statuses(&[200], "{}"), RetryPolicy::new());
        let (_, on_progress) = progress_log();

        let _: serde_json::Value = t
            .upload(&register_descriptor(), None, "avatar", on_progress)
            .await
            .unwrap();

        assert_eq!(t.client().captured_requests()[0].body_len(), 0);
    }

    #[tokio::test]
    async fn upload_failures_follow_retry_policy() {
        let t = transport(
            MockClient::statuses(&[500, 200], "{}"),
            RetryPolicy::new().with_limit(1),
        );
        let (_, on_progress) = progress_log();

        let _: serde_json::Value = t
            .upload(&register_descriptor(), Some(PNG.to_vec()), "avatar", on_progress)
            .await
            .unwrap();

        assert_eq!(t.client().calls(), 2);
    }
}

mod cancellation {
    use super::*;

    fn stalled() -> Transport<StalledClient, InstantSleeper> {
        Transport::from_parts(
            StalledClient,
            InstantSleeper,
            Arc::new(NoopAdapter),
            RetryPolicy::new(),
        )
    }

    #[tokio::test]
    async fn cancel_resolves_call_as_cancelled() {
        let call = stalled().send::<serde_json::Value>(&register_descriptor());
        call.cancel();

        assert!(matches!(call.await, Err(TransportError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_handle_outlives_call() {
        let call = stalled().send::<serde_json::Value>(&register_descriptor());
        let handle = call.cancel_handle();
        assert!(!handle.is_cancelled());

        handle.cancel();

        assert!(handle.is_cancelled());
        assert!(matches!(call.await, Err(TransportError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_after_completion_reports_cancelled() {
        let t = transport(MockClient::statuses(&[200], "{}"), RetryPolicy::new());
        let call = t.send::<serde_json::Value>(&register_descriptor());
        tokio::time::sleep(Duration::from_millis(20)).await;

        call.cancel();

        assert!(matches!(call.await, Err(TransportError::Cancelled)));
    }

    fn delayed(delay: Duration) -> Transport<MockClient, TokioSleeper> {
        Transport::from_parts(
            MockClient::statuses(&[500, 200], "{}"),
            TokioSleeper,
            Arc::new(NoopAdapter),
            RetryPolicy::new().with_limit(1).with_delay(delay),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_retry_delay_stops_further_attempts() {
        let t = delayed(Duration::from_secs(5));
        let call = t.send::<serde_json::Value>(&register_descriptor());

        // First attempt fails; the call is now waiting out the delay.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(t.client().calls(), 1);

        call.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(t.client().calls(), 1);
        assert!(matches!(call.await, Err(TransportError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_delay_does_not_block_the_caller() {
        let t = delayed(Duration::from_secs(30));
        let start = tokio::time::Instant::now();
        let call = t.send::<serde_json::Value>(&register_descriptor());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(t.client().calls(), 1);

        let _: serde_json::Value = call.await.unwrap();
        assert_eq!(t.client().calls(), 2);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }
}

mod panics {
    use super::*;

    struct UnavailableToken;

    impl TokenSource for UnavailableToken {
        fn token(&self) -> Option<String> {
            panic!("token store unavailable")
        }
    }

    #[tokio::test]
    async fn panicking_progress_callback_resolves_as_error() {
        let t = transport(MockClient::statuses(&[200], "{}"), RetryPolicy::new());
        let call = t.upload::<serde_json::Value>(
            &register_descriptor(),
            Some(b"%PDF-1.4".to_vec()),
            "doc",
            |_| panic!("boom"),
        );

        // Awaited on its own task: that task must finish normally.
        let outcome = tokio::spawn(call).await.unwrap();

        assert!(matches!(outcome, Err(TransportError::Panicked(ref m)) if m == "boom"));
    }

    #[tokio::test]
    async fn panicking_token_source_is_delivered_as_error() {
        let (dispatcher, mut main_loop) = main_context();
        let t = Transport::from_parts(
            MockClient::statuses(&[200], "{}"),
            InstantSleeper,
            Arc::new(BearerAdapter::new(UnavailableToken)),
            RetryPolicy::new(),
        );
        let got = Arc::new(Mutex::new(None));

        let g = got.clone();
        let _handle = t
            .send::<serde_json::Value>(&register_descriptor())
            .deliver_on(&dispatcher, move |result| *g.lock().unwrap() = Some(result));

        assert!(main_loop.run_next().await);
        let result = got.lock().unwrap().take().unwrap();
        assert!(matches!(
            result,
            Err(TransportError::Panicked(ref m)) if m == "token store unavailable"
        ));
        assert_eq!(t.client().calls(), 0);
    }
}

mod delivery {
    use super::*;

    #[tokio::test]
    async fn delivers_result_on_main_loop() {
        let (dispatcher, mut main_loop) = main_context();
        let t = transport(MockClient::statuses(&[200], r#"{"id":9}"#), RetryPolicy::new());
        let got = Arc::new(Mutex::new(None));

        let g = got.clone();
        let _handle = t
            .send::<Registered>(&register_descriptor())
            .deliver_on(&dispatcher, move |result| {
                *g.lock().unwrap() = Some(result.map(|r| r.id).ok());
            });

        assert!(main_loop.run_next().await);
        assert_eq!(*got.lock().unwrap(), Some(Some(9)));
    }

    #[tokio::test]
    async fn cancelled_call_is_never_delivered() {
        let (dispatcher, mut main_loop) = main_context();
        let call = Transport::from_parts(
            StalledClient,
            InstantSleeper,
            Arc::new(NoopAdapter),
            RetryPolicy::new(),
        )
        .send::<serde_json::Value>(&register_descriptor());
        let delivered = Arc::new(AtomicUsize::new(0));

        let d = delivered.clone();
        let handle = call.deliver_on(&dispatcher, move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(main_loop.run_pending(), 0);
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_before_main_loop_runs_suppresses_callback() {
        let (dispatcher, mut main_loop) = main_context();
        let t = transport(MockClient::statuses(&[200], "{}"), RetryPolicy::new());
        let delivered = Arc::new(AtomicUsize::new(0));

        let d = delivered.clone();
        let handle = t
            .send::<serde_json::Value>(&register_descriptor())
            .deliver_on(&dispatcher, move |_| {
                d.fetch_add(1, Ordering::SeqCst);
            });
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        main_loop.run_pending();

        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }
}

//! Tests for the run module.

use std::sync::Mutex;

use http::StatusCode;
use netlayer::session::SessionConfig;
use netlayer::time::InstantSleeper;
use netlayer::transport::{HttpError, HttpRequest, HttpResponse, RetryPolicy};

use super::*;

/// Mock client replaying scripted responses in order.
#[derive(Debug)]
struct MockClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
}

impl MockClient {
    fn new(responses: Vec<(u16, &str)>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(code, body)| {
                        Ok(HttpResponse::new(
                            StatusCode::from_u16(code).unwrap(),
                            http::HeaderMap::new(),
                            body.as_bytes().to_vec(),
                        ))
                    })
                    .collect(),
            ),
        }
    }
}

impl HttpClient for MockClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
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

fn session<H: Send + Sync + 'static>(
    make: impl Fn() -> H + Send + Sync + 'static,
    retry: RetryPolicy,
) -> Session<H, InstantSleeper> {
    let mut config = SessionConfig::new("https://api.example.com");
    config.transport.retry = retry;
    Session::with_client_factory(config, InstantSleeper, move |_| Ok(make()))
}

mod run_error {
    use super::*;

    #[test]
    fn interrupted_displays_message() {
        assert_eq!(
            RunError::Interrupted.to_string(),
            "Interrupted before the request completed"
        );
    }

    #[test]
    fn request_displays_source() {
        let error = RunError::Request(Arc::new(TransportError::Cancelled));
        assert_eq!(error.to_string(), "Registration failed: Request cancelled");
    }

    #[test]
    fn session_error_is_transparent() {
        let error = RunError::from(SessionError::Client(HttpError::Timeout));
        assert_eq!(error.to_string(), "Failed to build HTTP client: Request timed out");
    }
}

mod register_flow {
    use super::*;

    #[tokio::test]
    async fn returns_result_on_success() {
        let session = session(
            || MockClient::new(vec![(201, r#"{"id":11}"#)]),
            RetryPolicy::none(),
        );

        let result = register(
            &session,
            "alice".into(),
            "s3cret".into(),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(result.get("id"), Some(&serde_json::json!(11)));
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let session = session(
            || MockClient::new(vec![(500, ""), (500, ""), (200, "{}")]),
            RetryPolicy::new().with_limit(2),
        );

        let result = register(&session, "a".into(), "b".into(), std::future::pending()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn reports_exhausted_retries() {
        let session = session(
            || MockClient::new(vec![(500, ""), (500, "")]),
            RetryPolicy::new().with_limit(1),
        );

        let err = register(&session, "a".into(), "b".into(), std::future::pending())
            .await
            .unwrap_err();

        match err {
            RunError::Request(e) => assert!(e.is_exhausted()),
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_pending_call() {
        let session = session(|| StalledClient, RetryPolicy::none());

        let err = register(&session, "a".into(), "b".into(), async {})
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Interrupted));
    }

    #[tokio::test]
    async fn client_build_failure_is_session_error() {
        let session: Session<MockClient, InstantSleeper> = Session::with_client_factory(
            SessionConfig::new("https://api.example.com"),
            InstantSleeper,
            |_| Err(HttpError::Timeout),
        );

        let err = register(&session, "a".into(), "b".into(), std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Session(_)));
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use http::StatusCode;

use super::*;
use crate::router::RegisterRequest;
use crate::time::InstantSleeper;
use crate::transport::{HttpRequest, HttpResponse};

/// Mock client shared between the test and every transport the session builds.
#[derive(Debug, Default)]
struct MockClient {
    requests: Mutex<Vec<HttpRequest>>,
}

impl HttpClient for Arc<MockClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(req);
        Ok(HttpResponse::new(
            StatusCode::OK,
            http::HeaderMap::new(),
            br#"{"ok":true}"#.to_vec(),
        ))
    }
}

struct Fixture {
    client: Arc<MockClient>,
    builds: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            client: Arc::new(MockClient::default()),
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn session(&self, config: SessionConfig) -> Session<Arc<MockClient>, InstantSleeper> {
        let client = self.client.clone();
        let builds = self.builds.clone();
        Session::with_client_factory(config, InstantSleeper, move |_| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(client.clone())
        })
    }

    fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

fn config() -> SessionConfig {
    SessionConfig::new("https://api.example.com")
}

#[test]
fn nothing_is_built_until_first_use() {
    let fixture = Fixture::new();
    let session = fixture.session(config());

    assert!(!session.is_built());
    assert_eq!(fixture.builds(), 0);
}

#[test]
fn transport_is_built_once() {
    let fixture = Fixture::new();
    let session = fixture.session(config());

    session.transport().unwrap();
    session.transport().unwrap();
    session.register().unwrap();
    session.register().unwrap();

    assert!(session.is_built());
    assert_eq!(fixture.builds(), 1);
}

#[test]
fn reset_rebuilds_on_next_access() {
    let fixture = Fixture::new();
    let mut session = fixture.session(config());
    session.register().unwrap();

    session.reset();
    assert!(!session.is_built());

    session.register().unwrap();
    assert_eq!(fixture.builds(), 2);
}

#[test]
fn factory_failure_is_reported_and_retried_on_next_access() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = attempts.clone();
    let session = Session::with_client_factory(config(), InstantSleeper, move |_| {
        a.fetch_add(1, Ordering::SeqCst);
        Err::<Arc<MockClient>, _>(HttpError::Timeout)
    });

    assert!(matches!(session.transport(), Err(SessionError::Client(_))));
    assert!(session.register().is_err());
    assert!(!session.is_built());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn factory_receives_transport_config() {
    let mut cfg = config();
    cfg.transport.request_timeout = std::time::Duration::from_secs(3);
    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    let client = Arc::new(MockClient::default());
    let session = Session::with_client_factory(cfg, InstantSleeper, move |t| {
        *s.lock().unwrap() = Some(t.request_timeout);
        Ok(client.clone())
    });

    session.transport().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        Some(std::time::Duration::from_secs(3))
    );
}

#[test]
fn service_uses_session_base_url() {
    let fixture = Fixture::new();
    let session = fixture.session(config());

    assert_eq!(
        session.register().unwrap().base_url(),
        "https://api.example.com"
    );
}

#[tokio::test]
async fn static_token_is_attached() {
    let fixture = Fixture::new();
    let mut cfg = config();
    cfg.token = TokenConfig::Static("abc".into());
    let session = fixture.session(cfg);

    session
        .register()
        .unwrap()
        .register(RegisterRequest::new("a", "b"))
        .await
        .unwrap();

    let sent = fixture.client.requests.lock().unwrap();
    assert_eq!(
        sent[0].headers.get(http::header::AUTHORIZATION).unwrap(),
        "Bearer abc"
    );
}

#[tokio::test]
async fn shared_token_changes_are_picked_up() {
    let fixture = Fixture::new();
    let slot = SharedToken::new();
    let mut cfg = config();
    cfg.token = TokenConfig::Shared(slot.clone());
    let session = fixture.session(cfg);
    let service = session.register().unwrap();

    service.register(RegisterRequest::new("a", "b")).await.unwrap();
    slot.set(Some("late".into()));
    service.register(RegisterRequest::new("a", "b")).await.unwrap();

    let sent = fixture.client.requests.lock().unwrap();
    assert!(sent[0].headers.get(http::header::AUTHORIZATION).is_none());
    assert_eq!(
        sent[1].headers.get(http::header::AUTHORIZATION).unwrap(),
        "Bearer late"
    );
}

#[tokio::test]
async fn no_token_sends_no_authorization() {
    let fixture = Fixture::new();
    let session = fixture.session(config());

    session
        .register()
        .unwrap()
        .register(RegisterRequest::new("a", "b"))
        .await
        .unwrap();

    let sent = fixture.client.requests.lock().unwrap();
    assert!(sent[0].headers.get(http::header::AUTHORIZATION).is_none());
}

#[test]
fn debug_shows_build_state() {
    let fixture = Fixture::new();
    let session = fixture.session(config());

    let debug = format!("{session:?}");
    assert!(debug.contains("built: false"));
}

#[test]
fn debug_redacts_static_token() {
    let mut config = config();
    config.token = TokenConfig::Static("supersecret".into());

    let debug = format!("{config:?}");

    assert!(debug.contains("Static(\"<redacted>\")"));
    assert!(!debug.contains("supersecret"));
}

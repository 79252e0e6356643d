//! Retry, cleanup and cancellation behavior of the fetcher against scripted
//! clients, plus the reqwest client against a local mock server.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use dropmat_fetch::{BoxStream, FetchError, Fetcher, HttpClient, RetryPolicy};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
enum Step {
    Body(&'static [u8]),
    ConnectionRefused,
    NotFound,
    PartialThenReset(&'static [u8]),
    Hang,
}

/// Plays back `script`, then repeats `fallback` forever.
struct ScriptedClient {
    script:   Mutex<VecDeque<Step>>,
    fallback: Step,
    calls:    AtomicU32,
}

impl ScriptedClient {
    fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    fn always(step: Step) -> Self { Self::new([], step) }

    fn calls(&self) -> u32 { self.calls.load(Ordering::SeqCst) }
}

impl HttpClient for ScriptedClient {
    type Error = FetchError;

    async fn stream(
        &self,
        _url: &str,
    ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match step {
            Step::Body(body) => {
                let chunks: Vec<Result<Bytes, FetchError>> = body
                    .chunks(4)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect();
                Ok(Box::pin(futures_util::stream::iter(chunks)))
            }
            Step::ConnectionRefused => Err(FetchError::Connect("connection refused".into())),
            Step::NotFound => Err(FetchError::Status(404)),
            Step::PartialThenReset(body) => Ok(Box::pin(futures_util::stream::iter(vec![
                Ok(Bytes::from_static(body)),
                Err(FetchError::Network("connection reset by peer".into())),
            ]))),
            Step::Hang => {
                futures_util::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .max_attempts(max_attempts)
        .base_delay(Duration::ZERO)
        .attempt_timeout(Duration::from_millis(50))
}

#[tokio::test]
async fn test_fetch_success_creates_parents() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("bin").join("x64").join("tool.exe");
    let fetcher = Fetcher::new(ScriptedClient::always(Step::Body(b"MZ binary payload")));

    fetcher
        .fetch("https://blob.example/abc?sig=s", &dest, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"MZ binary payload");
    assert_eq!(fetcher.client().calls(), 1);
}

#[tokio::test]
async fn test_transient_errors_exhaust_after_max_attempts() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    let fetcher =
        Fetcher::new(ScriptedClient::always(Step::ConnectionRefused)).with_policy(fast_policy(10));

    let err = fetcher
        .fetch("https://blob.example/a", &dest, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RetriesExhausted { attempts: 10, .. }));
    assert!(matches!(err.last_error(), FetchError::Connect(_)));
    assert_eq!(fetcher.client().calls(), 10);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_non_transient_error_is_not_retried() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    let fetcher = Fetcher::new(ScriptedClient::always(Step::NotFound)).with_policy(fast_policy(10));

    let err = fetcher
        .fetch("https://blob.example/a", &dest, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status(404)));
    assert_eq!(fetcher.client().calls(), 1);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_partial_write_is_discarded_before_retry() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    let client = ScriptedClient::new(
        [Step::PartialThenReset(b"garbage-prefix"), Step::ConnectionRefused],
        Step::Body(b"complete"),
    );
    let fetcher = Fetcher::new(client).with_policy(fast_policy(10));

    fetcher
        .fetch("https://blob.example/a", &dest, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"complete");
    assert_eq!(fetcher.client().calls(), 3);
}

#[tokio::test]
async fn test_timeouts_exhaust_and_leave_no_file() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("slow.bin");
    let fetcher = Fetcher::new(ScriptedClient::always(Step::Hang)).with_policy(fast_policy(3));

    let err = fetcher
        .fetch("https://blob.example/slow", &dest, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RetriesExhausted { attempts: 3, .. }));
    assert!(matches!(err.last_error(), FetchError::Timeout));
    assert_eq!(fetcher.client().calls(), 3);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_existing_destination_is_not_overwritten() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    std::fs::write(&dest, "previous run").unwrap();
    let fetcher = Fetcher::new(ScriptedClient::always(Step::Body(b"new"))).with_policy(fast_policy(10));

    let err = fetcher
        .fetch("https://blob.example/a", &dest, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::DestinationExists(_)));
    assert_eq!(fetcher.client().calls(), 1);
    assert_eq!(std::fs::read(&dest).unwrap(), b"previous run");
}

#[tokio::test]
async fn test_cancel_interrupts_backoff() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    let policy = fast_policy(10).base_delay(Duration::from_secs(60));
    let fetcher = Fetcher::new(ScriptedClient::always(Step::ConnectionRefused)).with_policy(policy);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = fetcher
        .fetch("https://blob.example/a", &dest, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(fetcher.client().calls(), 1);
}

#[tokio::test]
async fn test_already_cancelled_makes_no_request() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a.bin");
    let fetcher = Fetcher::new(ScriptedClient::always(Step::Body(b"x")));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fetcher
        .fetch("https://blob.example/a", &dest, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Cancelled));
    assert_eq!(fetcher.client().calls(), 0);
    assert!(!dest.exists());
}

mod reqwest_client {
    use super::*;
    use dropmat_fetch::ReqwestClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_policy() -> RetryPolicy { fast_policy(3).attempt_timeout(Duration::from_secs(5)) }

    #[tokio::test]
    async fn test_downloads_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blobs/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"blob bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let fetcher = Fetcher::new(ReqwestClient::new().unwrap()).with_policy(server_policy());

        fetcher
            .fetch(&format!("{}/blobs/abc?sig=x", server.uri()), &dest, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"blob bytes");
    }

    #[tokio::test]
    async fn test_client_error_status_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let fetcher = Fetcher::new(ReqwestClient::new().unwrap()).with_policy(server_policy());

        let err = fetcher
            .fetch(&format!("{}/blobs/abc", server.uri()), &dest, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status(403)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_server_error_status_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let fetcher = Fetcher::new(ReqwestClient::new().unwrap()).with_policy(server_policy());

        let err = fetcher
            .fetch(&format!("{}/blobs/abc", server.uri()), &dest, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::RetriesExhausted { attempts: 3, .. }));
        assert!(matches!(err.last_error(), FetchError::Status(503)));
    }
}

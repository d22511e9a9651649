//! Fetching a day's coin catalog from the upstream price source.
//!
//! Two layers:
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`UpstreamSource`] | One attempt: request, status check, decode |
//! | [`UpstreamFetcher`] | Retry loop around a source, honouring [`RetryPolicy`] and [`Shutdown`] |
//!
//! Every transient failure (transport, non-2xx status, undecodable body) is
//! retried under the same policy. A decode failure never yields a partial or
//! empty snapshot.
//!
//! # Wire format
//!
//! `GET {base_url}/coins/{epoch_millis}` returning a JSON array of coin objects.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest};
use crate::retry::RetryPolicy;
use crate::shutdown::Shutdown;
use crate::{CatalogSnapshot, Coin, FetchError, SimDate};

/// A single-attempt source of daily coin catalogs.
pub trait UpstreamSource: Send + Sync {
    /// Fetch the catalog for `date` once, without retrying.
    fn fetch_once<'a>(
        &'a self,
        date: SimDate,
    ) -> Pin<Box<dyn Future<Output = Result<CatalogSnapshot, FetchError>> + Send + 'a>>;
}

/// Upstream reached over HTTP.
#[derive(Clone)]
pub struct HttpUpstream {
    base_url: String,
    client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new(base_url: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client,
            timeout: Duration::from_secs(3),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the catalog for `date`.
    pub fn coins_url(&self, date: SimDate) -> String {
        format!("{}/coins/{}", self.base_url, date.unix_millis())
    }
}

impl UpstreamSource for HttpUpstream {
    fn fetch_once<'a>(
        &'a self,
        date: SimDate,
    ) -> Pin<Box<dyn Future<Output = Result<CatalogSnapshot, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let request = HttpRequest::get(self.coins_url(date))
                .with_header("accept", "application/json")
                .with_timeout(self.timeout);

            let response = self.client.execute(request).await.map_err(|error| {
                let kind = match error.kind() {
                    HttpErrorKind::Connect => "connect",
                    HttpErrorKind::Timeout => "timeout",
                    HttpErrorKind::Other => "transport",
                };
                FetchError::Transport(format!("{kind}: {}", error.message()))
            })?;

            if !response.is_success() {
                return Err(FetchError::Status {
                    status: response.status,
                });
            }

            decode_coins(&response.body).map(|coins| CatalogSnapshot::new(Some(date), coins))
        })
    }
}

/// Decode an upstream body into coins, rejecting anything but a JSON array of coin objects.
pub fn decode_coins(body: &str) -> Result<Vec<Coin>, FetchError> {
    serde_json::from_str::<Vec<Coin>>(body).map_err(|error| FetchError::Decode(error.to_string()))
}

/// Retrying wrapper around an [`UpstreamSource`].
pub struct UpstreamFetcher {
    source: Arc<dyn UpstreamSource>,
    policy: RetryPolicy,
    attempts: AtomicU64,
}

impl UpstreamFetcher {
    pub fn new(source: Arc<dyn UpstreamSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Total attempts issued over this fetcher's lifetime.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Fetch the catalog for `date`, retrying transient failures.
    ///
    /// Returns only once an attempt succeeds, the policy runs out of attempts
    /// ([`FetchError::Exhausted`]), or shutdown is requested
    /// ([`FetchError::Cancelled`]); shutdown interrupts both an in-flight
    /// request and the wait between attempts.
    pub async fn fetch(
        &self,
        date: SimDate,
        shutdown: &mut Shutdown,
    ) -> Result<CatalogSnapshot, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            if shutdown.is_triggered() {
                return Err(FetchError::Cancelled);
            }

            attempt = attempt.saturating_add(1);
            self.attempts.fetch_add(1, Ordering::Relaxed);

            let outcome = tokio::select! {
                biased;
                _ = shutdown.triggered() => return Err(FetchError::Cancelled),
                outcome = self.source.fetch_once(date) => outcome,
            };

            let error = match outcome {
                Ok(snapshot) => {
                    if attempt > 1 {
                        tracing::info!(%date, attempt, "upstream recovered");
                    }
                    return Ok(snapshot);
                }
                Err(error) if error.is_transient() => error,
                Err(error) => return Err(error),
            };

            if !self.policy.allows_attempt(attempt.saturating_add(1)) {
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.policy.delay_after(attempt);
            tracing::warn!(
                %date,
                attempt,
                retry_in_ms = delay.as_millis() as u64,
                error = %error,
                "upstream fetch failed; retrying"
            );

            tokio::select! {
                biased;
                _ = shutdown.triggered() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::retry::Backoff;
    use crate::shutdown;
    use std::sync::Mutex;

    /// Replays canned responses and records requested URLs.
    struct CannedClient {
        responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
        seen: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn new(mut responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl HttpClient for CannedClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, crate::http_client::HttpError>> + Send + 'a>>
        {
            self.seen.lock().expect("lock").push(request.url);
            let next = self
                .responses
                .lock()
                .expect("lock")
                .pop()
                .unwrap_or_else(|| Err(HttpError::connect("script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn day() -> SimDate {
        SimDate::from_ymd(2014, 1, 1).expect("valid")
    }

    #[test]
    fn url_encodes_date_as_epoch_millis() {
        let upstream = HttpUpstream::new("http://upstream.test/", CannedClient::new(Vec::new()));
        assert_eq!(
            upstream.coins_url(day()),
            "http://upstream.test/coins/1388534400000"
        );
    }

    #[test]
    fn decode_rejects_non_array_payloads() {
        assert!(decode_coins(r#"{"id":"btc"}"#).is_err());
        assert!(decode_coins("not json").is_err());
        assert!(decode_coins(r#"[{"id":"btc"},{"price":1}]"#).is_err());
        assert_eq!(decode_coins("[]").expect("empty array is valid").len(), 0);
    }

    #[tokio::test]
    async fn single_attempt_maps_failures() {
        let client = CannedClient::new(vec![
            Err(HttpError::timeout("slow")),
            Ok(HttpResponse {
                status: 502,
                body: String::new(),
            }),
            Ok(HttpResponse::ok_json("{")),
            Ok(HttpResponse::ok_json(r#"[{"id":"btc","price":1.5}]"#)),
        ]);
        let upstream = HttpUpstream::new("http://upstream.test", client.clone());

        assert!(matches!(upstream.fetch_once(day()).await, Err(FetchError::Transport(_))));
        assert_eq!(
            upstream.fetch_once(day()).await,
            Err(FetchError::Status { status: 502 })
        );
        assert!(matches!(upstream.fetch_once(day()).await, Err(FetchError::Decode(_))));

        let snapshot = upstream.fetch_once(day()).await.expect("succeeds");
        assert_eq!(snapshot.as_of, Some(day()));
        assert_eq!(snapshot.coins[0].id.as_str(), "btc");
        assert_eq!(client.seen.lock().expect("lock").len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn decode_failures_are_retried_like_transport_failures() {
        let client = CannedClient::new(vec![
            Ok(HttpResponse::ok_json("<html>maintenance</html>")),
            Ok(HttpResponse::ok_json(r#"[{"id":"eth"}]"#)),
        ]);
        let fetcher = UpstreamFetcher::new(
            Arc::new(HttpUpstream::new("http://upstream.test", client)),
            RetryPolicy::default(),
        );
        let (_trigger, mut shutdown) = shutdown::channel();

        let started = tokio::time::Instant::now();
        let snapshot = fetcher.fetch(day(), &mut shutdown).await.expect("second attempt succeeds");

        assert_eq!(snapshot.coins.len(), 1);
        assert_eq!(fetcher.attempts(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_policy_reports_exhaustion() {
        let client = CannedClient::new(vec![
            Err(HttpError::connect("refused")),
            Err(HttpError::connect("refused")),
            Err(HttpError::connect("refused")),
        ]);
        let fetcher = UpstreamFetcher::new(
            Arc::new(HttpUpstream::new("http://upstream.test", client)),
            RetryPolicy::bounded(3, Backoff::Fixed { delay: Duration::from_millis(250) }),
        );
        let (_trigger, mut shutdown) = shutdown::channel();

        let started = tokio::time::Instant::now();
        let error = fetcher.fetch(day(), &mut shutdown).await.expect_err("gives up");

        match error {
            FetchError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, FetchError::Transport(_)));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_retry_delay() {
        let fetcher = UpstreamFetcher::new(
            Arc::new(HttpUpstream::new("http://upstream.test", CannedClient::new(Vec::new()))),
            RetryPolicy::unbounded(Duration::from_secs(3600)),
        );
        let (trigger, mut shutdown) = shutdown::channel();

        let started = tokio::time::Instant::now();
        let task = tokio::spawn(async move { fetcher.fetch(day(), &mut shutdown).await });
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.trigger();

        let result = task.await.expect("task should not panic");
        assert_eq!(result, Err(FetchError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(3600));
    }
}

//! Rate-limited, retrying request queue.

use crate::error::classify;
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use crate::types::{ApiRequest, ApiResponse, ClientConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use walkup_core::{AuthProvider, Result, WalkupError};

/// A queued request and the caller waiting on it
struct Pending {
    request: ApiRequest,
    reply: oneshot::Sender<Result<ApiResponse>>,
}

/// Serializes provider calls through one drain task.
///
/// Requests are dispatched strictly in FIFO order, one at a time, with at
/// least `1 / max_requests_per_second` between two dispatches (retries
/// count against the same budget). Transient failures and 429s are retried;
/// everything else is handed back to the caller on the first answer.
///
/// Cloning is cheap and every clone feeds the same queue. The drain task
/// exits once the last clone is dropped.
///
/// # Example
///
/// ```ignore
/// use walkup_client::{ApiRequest, ClientConfig, RateLimitedClient, ReqwestTransport};
///
/// let config = ClientConfig::default();
/// let transport = ReqwestTransport::new(&config)?;
/// let client = RateLimitedClient::new(transport, &config, None)?;
///
/// let response = client.enqueue(ApiRequest::get("me/player/devices")).await?;
/// println!("{}", response.body);
/// ```
#[derive(Clone)]
pub struct RateLimitedClient {
    queue: mpsc::UnboundedSender<Pending>,
}

impl RateLimitedClient {
    /// Create the client and spawn its drain task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<H>(
        transport: H,
        config: &ClientConfig,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> Result<Self>
    where
        H: HttpTransport + 'static,
    {
        config.validate()?;

        let (queue, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher {
            transport,
            auth,
            retry: RetryPolicy::from_config(config),
            interval: config.min_interval(),
            last_dispatch: None,
        };

        info!(
            max_requests_per_second = config.max_requests_per_second,
            max_retries = config.max_retries,
            "Starting request queue"
        );
        tokio::spawn(dispatcher.run(rx));

        Ok(Self { queue })
    }

    /// Queue `request` and wait for its final outcome.
    ///
    /// Resolves with the first success or the terminal error; retries happen
    /// inside the queue. Dropping the returned future before dispatch takes
    /// the request out of the queue.
    pub async fn enqueue(&self, request: ApiRequest) -> Result<ApiResponse> {
        let (reply, rx) = oneshot::channel();
        self.queue
            .send(Pending { request, reply })
            .map_err(|_| WalkupError::network("request queue is closed"))?;

        rx.await
            .map_err(|_| WalkupError::network("request queue stopped before answering"))?
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.query(*k, *v));
        self.enqueue(request).await?.json()
    }

    /// PUT a JSON body to `path`, ignoring the response body.
    pub async fn put_json<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<()> {
        let request = query
            .iter()
            .fold(ApiRequest::put(path), |req, (k, v)| req.query(*k, *v))
            .json(body)?;
        self.enqueue(request).await.map(|_| ())
    }

    /// PUT to `path` with no body.
    pub async fn put(&self, path: &str, query: &[(&str, &str)]) -> Result<()> {
        let request = query
            .iter()
            .fold(ApiRequest::put(path), |req, (k, v)| req.query(*k, *v));
        self.enqueue(request).await.map(|_| ())
    }
}

/// State owned by the drain task
struct Dispatcher<H> {
    transport: H,
    auth: Option<Arc<dyn AuthProvider>>,
    retry: RetryPolicy,
    interval: Duration,
    last_dispatch: Option<Instant>,
}

impl<H: HttpTransport> Dispatcher<H> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Pending>) {
        while let Some(pending) = rx.recv().await {
            if pending.reply.is_closed() {
                debug!(path = %pending.request.path, "Caller went away, skipping request");
                continue;
            }

            let result = self.execute(pending.request).await;
            if pending.reply.send(result).is_err() {
                debug!("Caller went away before the answer arrived");
            }
        }
        debug!("Request queue closed");
    }

    async fn execute(&mut self, mut request: ApiRequest) -> Result<ApiResponse> {
        let mut attempt = 0;
        loop {
            if let Some(auth) = &self.auth {
                match auth.access_token().await {
                    Some(token) => request.bearer_token = Some(token),
                    None => return Err(WalkupError::auth("No access token available")),
                }
            }

            self.pace().await;
            debug!(
                method = request.method.as_str(),
                path = %request.path,
                attempt,
                "Dispatching request"
            );

            let error = match self.transport.send(&request).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => classify(&response),
                Err(e) => e,
            };

            match self.retry.delay_for(&error, attempt) {
                Some(delay) => {
                    warn!(
                        path = %request.path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    if error.is_retryable() {
                        warn!(
                            path = %request.path,
                            attempts = attempt + 1,
                            error = %error,
                            "Retries exhausted"
                        );
                    } else {
                        debug!(path = %request.path, error = %error, "Request failed");
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Hold the next dispatch until the interval since the last one passed
    async fn pace(&mut self) {
        if let Some(last) = self.last_dispatch {
            let next = last + self.interval;
            if next > Instant::now() {
                debug!(
                    wait_ms = (next - Instant::now()).as_millis() as u64,
                    "Rate limiting"
                );
                tokio::time::sleep_until(next).await;
            }
        }
        self.last_dispatch = Some(Instant::now());
    }
}

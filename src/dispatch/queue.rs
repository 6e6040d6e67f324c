//! Single-flight request queue.
//!
//! [`Dispatcher`] is a cheap-to-clone handle; every clone feeds the same FIFO
//! queue.  One [`DispatchWorker`] task drains it:
//!
//! ```text
//! submit() ──▶ mpsc (FIFO) ──▶ DispatchWorker::run()
//!                                 │
//!                                 ├─ rate window full?  → sleep(cooldown), reset
//!                                 ├─ gateway.send()      (one at a time)
//!                                 │     ├─ Ok           → normalize_reply → settle
//!                                 │     ├─ transient    → sleep(base × k), retry
//!                                 │     └─ terminal     → Failure → settle
//!                                 └─ more queued?       → sleep(spacing), next
//! ```
//!
//! The worker owns the queue receiver and the rate window, so no locks guard
//! them.  Callers always receive a [`NormalizedResult`]; failures are
//! settled as `Failure(_)` markers, never as errors.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::config::DispatcherConfig;
use crate::gateway::{Gateway, GatewayError, GatewayRequest};
use crate::llm::{normalize_reply, FailureReason, NormalizedResult};

use super::rate::RateWindow;
use super::retry::RetryPolicy;
use super::status::DispatchStatus;

// ---------------------------------------------------------------------------
// QueuedRequest
// ---------------------------------------------------------------------------

/// One pending call, owned by the worker until it is settled.
pub(crate) struct QueuedRequest {
    prompt: String,
    json_mode: bool,
    retry_count: u32,
    reply: oneshot::Sender<NormalizedResult>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Handle to the request queue.
///
/// ```rust,no_run
/// use language_coach::config::AppConfig;
/// use language_coach::dispatch::Dispatcher;
/// use language_coach::gateway;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let dispatcher = Dispatcher::spawn(gateway::from_config(&config.gateway), &config.dispatcher);
///
/// let reply = dispatcher.submit("Say hello", false).await;
/// println!("{reply:?}");
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<QueuedRequest>,
    pending: Arc<AtomicUsize>,
    status: watch::Receiver<DispatchStatus>,
}

impl Dispatcher {
    /// Start the worker task on the current tokio runtime.
    ///
    /// The worker stops once every `Dispatcher` clone has been dropped and the
    /// queue is drained.
    pub fn spawn(gateway: Arc<dyn Gateway>, config: &DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(DispatchStatus::Idle);
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = DispatchWorker::new(gateway, config, rx, status_tx, Arc::clone(&pending));
        tokio::spawn(worker.run());

        Self {
            tx,
            pending,
            status: status_rx,
        }
    }

    /// Queue `prompt` for transmission.
    ///
    /// The request is enqueued immediately, before the returned future is
    /// first polled, so the order of `submit` calls is the transmission order.
    pub fn submit(
        &self,
        prompt: impl Into<String>,
        json_mode: bool,
    ) -> impl Future<Output = NormalizedResult> + Send + 'static {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = QueuedRequest {
            prompt: prompt.into(),
            json_mode,
            retry_count: 0,
            reply: reply_tx,
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            log::warn!("dispatch: worker stopped; request dropped");
        }

        async move {
            reply_rx
                .await
                .unwrap_or(NormalizedResult::Failure(FailureReason::Unavailable))
        }
    }

    /// Requests submitted but not yet settled.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Subscribe to status transitions.
    pub fn status(&self) -> watch::Receiver<DispatchStatus> {
        self.status.clone()
    }
}

// ---------------------------------------------------------------------------
// DispatchWorker
// ---------------------------------------------------------------------------

struct DispatchWorker {
    gateway: Arc<dyn Gateway>,
    rx: mpsc::UnboundedReceiver<QueuedRequest>,
    rate: RateWindow,
    retry: RetryPolicy,
    spacing: Duration,
    cooldown: Duration,
    status: watch::Sender<DispatchStatus>,
    pending: Arc<AtomicUsize>,
}

impl DispatchWorker {
    fn new(
        gateway: Arc<dyn Gateway>,
        config: &DispatcherConfig,
        rx: mpsc::UnboundedReceiver<QueuedRequest>,
        status: watch::Sender<DispatchStatus>,
        pending: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            gateway,
            rx,
            rate: RateWindow::new(config.rate_limit, config.rate_window(), Instant::now()),
            retry: RetryPolicy::from_config(config),
            spacing: config.request_spacing(),
            cooldown: config.cooldown(),
            status,
            pending,
        }
    }

    async fn run(mut self) {
        let mut next = self.rx.recv().await;

        while let Some(request) = next {
            self.dispatch(request).await;

            next = match self.rx.try_recv() {
                Ok(request) => {
                    if !self.spacing.is_zero() {
                        tokio::time::sleep(self.spacing).await;
                    }
                    Some(request)
                }
                Err(TryRecvError::Empty) => {
                    self.set_status(DispatchStatus::Idle);
                    self.rx.recv().await
                }
                Err(TryRecvError::Disconnected) => None,
            };
        }

        self.set_status(DispatchStatus::Idle);
        log::info!("dispatch: all handles dropped, worker shutting down");
    }

    /// Transmit one request until it succeeds, fails terminally, or runs out
    /// of retries; then settle it.
    async fn dispatch(&mut self, request: QueuedRequest) {
        let QueuedRequest {
            prompt,
            json_mode,
            mut retry_count,
            reply,
        } = request;
        let outbound = GatewayRequest::new(prompt, json_mode);

        self.set_status(DispatchStatus::Processing {
            remaining: self.pending.load(Ordering::SeqCst),
        });

        let result = loop {
            self.await_rate_budget().await;

            log::debug!(
                "dispatch: sending (attempt {}, json={}, len={})",
                retry_count + 1,
                json_mode,
                outbound.prompt.len()
            );
            let outcome = self.gateway.send(&outbound).await;
            self.rate.record();

            match outcome {
                // A malformed JSON payload surfaces here as Failure(InvalidJson)
                // and is settled as-is.
                Ok(envelope) => break normalize_reply(envelope, json_mode),
                Err(err) if self.retry.should_retry(&err, retry_count) => {
                    retry_count += 1;
                    let delay = self.retry.delay_for(retry_count);
                    log::warn!(
                        "dispatch: {err}; retry {retry_count}/{} in {} ms",
                        self.retry.max_retries,
                        delay.as_millis()
                    );
                    self.set_status(DispatchStatus::Retrying {
                        attempt: retry_count,
                        delay,
                    });
                    tokio::time::sleep(delay).await;
                    self.set_status(DispatchStatus::Processing {
                        remaining: self.pending.load(Ordering::SeqCst),
                    });
                }
                Err(err) => break NormalizedResult::Failure(terminal_reason(err, retry_count)),
            }
        };

        if let NormalizedResult::Failure(reason) = &result {
            log::warn!("dispatch: request failed: {reason}");
            self.set_status(DispatchStatus::Failed {
                reason: reason.to_string(),
            });
        }

        self.pending.fetch_sub(1, Ordering::SeqCst);
        if reply.send(result).is_err() {
            log::debug!("dispatch: caller went away before settlement");
        }
    }

    /// Suspend dispatch for the cooldown if the rate ceiling has been reached.
    async fn await_rate_budget(&mut self) {
        self.rate.roll(Instant::now());
        if !self.rate.is_exhausted() {
            return;
        }

        log::warn!(
            "dispatch: rate limit reached ({} requests), cooling down for {} ms",
            self.rate.count(),
            self.cooldown.as_millis()
        );
        self.set_status(DispatchStatus::Cooldown {
            wait: self.cooldown,
        });
        tokio::time::sleep(self.cooldown).await;
        self.rate.reset(Instant::now());
        self.set_status(DispatchStatus::Processing {
            remaining: self.pending.load(Ordering::SeqCst),
        });
    }

    fn set_status(&self, status: DispatchStatus) {
        // No subscribers is fine: status is advisory.
        let _ = self.status.send(status);
    }
}

/// Failure marker for an error the dispatcher will not (or can no longer) retry.
fn terminal_reason(err: GatewayError, retries_done: u32) -> FailureReason {
    match err {
        GatewayError::MissingCredential => FailureReason::Configuration(err.to_string()),
        GatewayError::MalformedJson(_) => FailureReason::InvalidJson,
        err if err.is_transient() => FailureReason::Exhausted {
            attempts: retries_done + 1,
            last_error: err.to_string(),
        },
        err => FailureReason::Rejected(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::ScriptedGateway;
    use crate::gateway::GatewayReply;

    fn fast_config() -> DispatcherConfig {
        DispatcherConfig::default()
    }

    fn spawn(gateway: &Arc<ScriptedGateway>, config: &DispatcherConfig) -> Dispatcher {
        let gw: Arc<dyn Gateway> = Arc::clone(gateway) as Arc<dyn Gateway>;
        Dispatcher::spawn(gw, config)
    }

    #[tokio::test(start_paused = true)]
    async fn transmits_in_submission_order_without_overlap() {
        let gateway =
            Arc::new(ScriptedGateway::new().with_latency(Duration::from_millis(200)));
        let dispatcher = spawn(&gateway, &fast_config());

        let pending: Vec<_> = (0..6)
            .map(|i| dispatcher.submit(format!("prompt-{i}"), false))
            .collect();

        let mut results = Vec::new();
        for fut in pending {
            results.push(fut.await);
        }

        let expected: Vec<String> = (0..6).map(|i| format!("prompt-{i}")).collect();
        assert_eq!(gateway.prompts(), expected);
        assert_eq!(gateway.max_in_flight(), 1);

        // Each caller gets its own reply back.
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result, NormalizedResult::Text(format!("echo: prompt-{i}")));
        }
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_back_to_back_dispatches() {
        let gateway = Arc::new(ScriptedGateway::new());
        let dispatcher = spawn(&gateway, &fast_config());

        let a = dispatcher.submit("a", false);
        let b = dispatcher.submit("b", false);
        let c = dispatcher.submit("c", false);
        a.await;
        b.await;
        c.await;

        let times = gateway.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_429_with_linear_backoff_then_succeeds() {
        let gateway = Arc::new(ScriptedGateway::with_script([
            Err(GatewayError::RateLimited),
            Err(GatewayError::RateLimited),
            Err(GatewayError::RateLimited),
            Ok(GatewayReply::text("finally")),
        ]));
        let dispatcher = spawn(&gateway, &fast_config());

        let result = dispatcher.submit("retry me", false).await;
        assert_eq!(result, NormalizedResult::Text("finally".into()));
        assert_eq!(gateway.call_count(), 4);

        let times = gateway.call_times();
        for (k, pair) in times.windows(2).enumerate() {
            let expected = Duration::from_secs(k as u64 + 1);
            assert!(
                pair[1].duration_since(pair[0]) >= expected,
                "retry {} waited less than {:?}",
                k + 1,
                expected
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_settle_with_failure_marker() {
        let gateway = Arc::new(ScriptedGateway::with_script(
            std::iter::repeat_with(|| Err(GatewayError::RateLimited)).take(10),
        ));
        let dispatcher = spawn(&gateway, &fast_config());

        let result = dispatcher.submit("never works", false).await;
        match result {
            NormalizedResult::Failure(FailureReason::Exhausted { attempts, .. }) => {
                assert_eq!(attempts, 4)
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        // One initial attempt plus three retries.
        assert_eq!(gateway.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn network_error_is_retried() {
        let gateway = Arc::new(ScriptedGateway::with_script([
            Err(GatewayError::Transport("connection reset".into())),
            Ok(GatewayReply::text("ok")),
        ]));
        let dispatcher = spawn(&gateway, &fast_config());

        assert_eq!(
            dispatcher.submit("p", false).await,
            NormalizedResult::Text("ok".into())
        );
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_json_is_terminal() {
        let gateway = Arc::new(ScriptedGateway::with_script([
            Ok(GatewayReply::text("definitely not json")),
            Ok(GatewayReply::text("{\"would\": \"parse\"}")),
        ]));
        let dispatcher = spawn(&gateway, &fast_config());

        let result = dispatcher.submit("give me json", true).await;
        assert_eq!(result, NormalizedResult::Failure(FailureReason::InvalidJson));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_not_retried() {
        let gateway = Arc::new(ScriptedGateway::with_script([Err(GatewayError::Status {
            code: 500,
            message: "Server error".into(),
        })]));
        let dispatcher = spawn(&gateway, &fast_config());

        let result = dispatcher.submit("p", false).await;
        assert!(matches!(
            result,
            NormalizedResult::Failure(FailureReason::Rejected(_))
        ));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credential_is_a_configuration_failure() {
        let gateway = Arc::new(ScriptedGateway::with_script([Err(
            GatewayError::MissingCredential,
        )]));
        let dispatcher = spawn(&gateway, &fast_config());

        let result = dispatcher.submit("p", false).await;
        assert!(matches!(
            result,
            NormalizedResult::Failure(FailureReason::Configuration(_))
        ));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn envelope_error_settles_as_upstream_failure() {
        let gateway = Arc::new(ScriptedGateway::with_script([Ok(GatewayReply::error(
            "API key not configured",
        ))]));
        let dispatcher = spawn(&gateway, &fast_config());

        assert_eq!(
            dispatcher.submit("p", true).await,
            NormalizedResult::Failure(FailureReason::Upstream("API key not configured".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_ceiling_triggers_cooldown_without_dropping_work() {
        let gateway = Arc::new(ScriptedGateway::new());
        let config = DispatcherConfig {
            request_spacing_ms: 0,
            rate_limit: 2,
            cooldown_ms: 5_000,
            ..DispatcherConfig::default()
        };
        let dispatcher = spawn(&gateway, &config);

        let futs: Vec<_> = (0..4).map(|i| dispatcher.submit(format!("r{i}"), false)).collect();
        for fut in futs {
            assert!(!fut.await.is_failure());
        }

        let times = gateway.call_times();
        assert_eq!(times.len(), 4);
        assert!(times[1].duration_since(times[0]) < Duration::from_secs(1));
        assert!(times[2].duration_since(times[1]) >= Duration::from_secs(5));
        // The cooldown opened a fresh window with room for two more.
        assert!(times[3].duration_since(times[2]) < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn status_returns_to_idle_after_drain() {
        let gateway = Arc::new(ScriptedGateway::new());
        let dispatcher = spawn(&gateway, &fast_config());
        let mut status = dispatcher.status();

        dispatcher.submit("one", false).await;

        // The worker flips to Idle right after settling.
        while *status.borrow_and_update() != DispatchStatus::Idle {
            status.changed().await.unwrap();
        }
        assert_eq!(*status.borrow(), DispatchStatus::Idle);
    }

    #[test]
    fn terminal_reason_mapping() {
        assert!(matches!(
            terminal_reason(GatewayError::Timeout, 3),
            FailureReason::Exhausted { attempts: 4, .. }
        ));
        assert!(matches!(
            terminal_reason(GatewayError::EmptyPrompt, 0),
            FailureReason::Rejected(_)
        ));
        assert_eq!(
            terminal_reason(GatewayError::MalformedJson("Invalid JSON response from AI".into()), 0),
            FailureReason::InvalidJson
        );
        assert!(matches!(
            terminal_reason(GatewayError::MissingCredential, 0),
            FailureReason::Configuration(_)
        ));
    }
}

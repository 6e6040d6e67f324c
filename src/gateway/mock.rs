//! Scripted [`Gateway`] test double (compiled for tests only).
//!
//! Replies are popped from a script in call order; once the script runs dry
//! every call echoes its prompt as text.  Each call is recorded together with
//! the (tokio) instant it started, and the maximum number of overlapping
//! calls is tracked so tests can assert single-flight dispatch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Gateway, GatewayError, GatewayReply, GatewayRequest};

pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<GatewayReply, GatewayError>>>,
    calls: Mutex<Vec<(GatewayRequest, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Gateway that answers the given replies in order, then echoes.
    pub fn with_script(
        replies: impl IntoIterator<Item = Result<GatewayReply, GatewayError>>,
    ) -> Self {
        let gateway = Self::new();
        gateway.script.lock().unwrap().extend(replies);
        gateway
    }

    /// Simulated transmission time per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, reply: Result<GatewayReply, GatewayError>) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(req, _)| req.prompt.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(req, _)| req.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn send(&self, request: &GatewayRequest) -> Result<GatewayReply, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.clone(), Instant::now()));

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayReply::text(format!("echo: {}", request.prompt))));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

//! Delegated request continuations.
//!
//! A handler that cannot answer within its callback marks the requests
//! delegated and returns a [`ContinuationToken`] instead. The dispatcher keeps
//! the token in an [`AlarmQueue`] and resumes it once its delay elapses, before
//! the PDU moves on to its next mode.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use super::{AgentRequestInfo, Handler, HandlerRegistration, HandlerResult, Mode, Request};

/// Everything needed to resume a delegated batch.
pub struct ContinuationToken {
    handler: Handler,
    registration: Arc<HandlerRegistration>,
    mode: Mode,
    requests: Vec<usize>,
    delay: Duration,
    state: Box<dyn Any + Send>,
}

impl ContinuationToken {
    pub(crate) fn new(
        handler: Handler,
        registration: Arc<HandlerRegistration>,
        mode: Mode,
        requests: Vec<usize>,
        state: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            handler,
            registration,
            mode,
            requests,
            delay: Duration::ZERO,
            state,
        }
    }

    /// Resume no earlier than `delay` after the token is queued.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Mode the batch was delegated in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn registration(&self) -> &Arc<HandlerRegistration> {
        &self.registration
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// PDU positions of the delegated requests.
    pub fn request_indexes(&self) -> &[usize] {
        &self.requests
    }

    /// Run the delegating handler's [`resume`](super::MibHandler::resume).
    ///
    /// `requests` should hold the requests named by
    /// [`request_indexes`](Self::request_indexes). The saved mode is in effect
    /// for the call and the caller's mode is restored afterwards.
    pub fn resume(self, reqinfo: &mut AgentRequestInfo, requests: &mut [Request]) -> HandlerResult {
        tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::DEBUG,
            snmp.registration = %self.registration.name(),
            snmp.handler = %self.handler.name(),
            snmp.mode = %self.mode,
            snmp.varbind_count = requests.len(),
            "resuming delegated requests"
        );
        let saved = reqinfo.set_mode(self.mode);
        let result = self
            .handler
            .node()
            .resume(&self.registration, reqinfo, requests, self.state);
        reqinfo.set_mode(saved);
        result
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationToken")
            .field("handler", &self.handler.name())
            .field("registration", &self.registration.name())
            .field("mode", &self.mode)
            .field("requests", &self.requests)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Pending continuations ordered by deadline.
#[derive(Debug, Default)]
pub struct AlarmQueue {
    pending: Vec<(Instant, ContinuationToken)>,
}

impl AlarmQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `token` to fire after its delay.
    pub fn register_alarm(&mut self, token: ContinuationToken) {
        let deadline = Instant::now() + token.delay();
        let pos = self.pending.partition_point(|(d, _)| *d <= deadline);
        self.pending.insert(pos, (deadline, token));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the earliest pending alarm.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|(d, _)| *d)
    }

    /// Wait for the earliest alarm and take its token.
    ///
    /// Alarms with equal deadlines fire in registration order. Returns `None`
    /// immediately when nothing is queued.
    pub async fn next_due(&mut self) -> Option<ContinuationToken> {
        let deadline = self.next_deadline()?;
        sleep_until(deadline).await;
        Some(self.pending.remove(0).1)
    }

    /// Remove the tokens matching `pred` without waiting for them.
    ///
    /// The remaining alarms keep their deadlines.
    pub fn take_where<F>(&mut self, mut pred: F) -> Vec<ContinuationToken>
    where
        F: FnMut(&ContinuationToken) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.pending.len());
        for (deadline, token) in self.pending.drain(..) {
            if pred(&token) {
                taken.push(token);
            } else {
                kept.push((deadline, token));
            }
        }
        self.pending = kept;
        taken
    }

    /// Drop every pending token, returning them for cleanup.
    pub fn drain(&mut self) -> Vec<ContinuationToken> {
        self.pending.drain(..).map(|(_, t)| t).collect()
    }
}

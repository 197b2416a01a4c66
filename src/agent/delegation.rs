//! Resuming delegated requests.

use crate::error::ErrorStatus;
use crate::handler::{AgentRequestInfo, AlarmQueue, ContinuationToken, HandlerResult, Request};

use super::{Dispatcher, put_back, take_batch};

impl Dispatcher {
    /// Re-enter the handler that produced `token`.
    ///
    /// `requests` are the delegated requests named by the token. The mode of
    /// `reqinfo` is the same on return as on entry.
    pub fn resume(
        &self,
        token: ContinuationToken,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let result = token.resume(reqinfo, requests);
        for request in requests.iter_mut().filter(|r| r.is_delegated()) {
            if result.as_ref().is_ok_and(|d| !d.is_complete()) {
                continue;
            }
            tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::WARN,
                snmp.oid = %request.oid(),
                "delegated request was not completed on resume"
            );
            request.set_delegated(false);
            request.set_error(ErrorStatus::GenErr);
        }
        result
    }

    /// Resume queued continuations until none remain.
    ///
    /// A continuation asking to wait longer than its registration's timeout is
    /// not waited for; its requests fail with `genErr`.
    pub(super) async fn run_alarms(
        &self,
        reqinfo: &mut AgentRequestInfo,
        slots: &mut [Option<Request>],
        alarms: &mut AlarmQueue,
        aborted: &mut Option<(ErrorStatus, usize)>,
    ) {
        loop {
            for token in alarms.take_where(overdue) {
                tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::WARN,
                    snmp.registration = %token.registration().name(),
                    snmp.handler = %token.handler().name(),
                    "delegated requests timed out"
                );
                expire(slots, &token);
            }

            let Some(token) = alarms.next_due().await else {
                break;
            };
            let registration = token.registration().clone();
            let positions = token.request_indexes().to_vec();
            let mut batch = take_batch(slots, &positions);
            let result = self.resume(token, reqinfo, &mut batch);
            put_back(slots, batch);
            self.absorb(&registration, result, &positions, alarms, aborted);
        }
    }
}

fn overdue(token: &ContinuationToken) -> bool {
    token
        .registration()
        .timeout()
        .is_some_and(|timeout| token.delay() > timeout)
}

fn expire(slots: &mut [Option<Request>], token: &ContinuationToken) {
    for &position in token.request_indexes() {
        if let Some(request) = slots.get_mut(position).and_then(Option::as_mut) {
            request.set_delegated(false);
            request.set_error(ErrorStatus::GenErr);
        }
    }
}

//! Handlers that record how they were called.

use std::sync::Arc;

use parking_lot::Mutex;
use snmp_dispatch::handler::{Dispatch, Handler, Mode, Request};
use snmp_dispatch::{ErrorStatus, Oid, Value};

/// One handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub handler: &'static str,
    pub mode: Mode,
    pub oids: Vec<Oid>,
}

/// Collects calls made to the handlers it hands out.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, handler: &'static str, mode: Mode, requests: &[Request]) {
        self.calls.lock().push(Call {
            handler,
            mode,
            oids: requests.iter().map(|r| r.oid().clone()).collect(),
        });
    }

    /// A helper that records the call and forwards.
    pub fn pass(&self, name: &'static str) -> Handler {
        let recorder = self.clone();
        Handler::from_fn(name, move |ctx, reqinfo, requests| {
            recorder.record(name, reqinfo.mode(), requests);
            ctx.call_next(reqinfo, requests)
        })
    }

    /// A leaf answering every unprocessed request with `value`.
    pub fn leaf(&self, name: &'static str, value: Value) -> Handler {
        let recorder = self.clone();
        Handler::from_fn(name, move |_ctx, reqinfo, requests| {
            recorder.record(name, reqinfo.mode(), requests);
            for request in requests.iter_mut().filter(|r| !r.is_processed()) {
                if reqinfo.mode().is_set() {
                    request.mark_processed();
                } else {
                    request.set_value(value.clone());
                }
            }
            Ok(Dispatch::Complete)
        })
    }

    /// A leaf that fails with `status` whenever the mode is `mode`.
    pub fn failing_in(&self, name: &'static str, mode: Mode, status: ErrorStatus) -> Handler {
        let recorder = self.clone();
        Handler::from_fn(name, move |_ctx, reqinfo, requests| {
            recorder.record(name, reqinfo.mode(), requests);
            for request in requests.iter_mut().filter(|r| !r.is_processed()) {
                if reqinfo.mode() == mode {
                    request.set_error(status);
                    return Err(status);
                }
                request.mark_processed();
            }
            Ok(Dispatch::Complete)
        })
    }

    /// A leaf that fails with `status` on the request at PDU position `position`
    /// and answers the others with their position.
    pub fn failing_in_position(
        &self,
        name: &'static str,
        position: usize,
        status: ErrorStatus,
    ) -> Handler {
        let recorder = self.clone();
        Handler::from_fn(name, move |_ctx, reqinfo, requests| {
            recorder.record(name, reqinfo.mode(), requests);
            for request in requests.iter_mut().filter(|r| !r.is_processed()) {
                if request.index() == position {
                    request.set_error(status);
                    return Err(status);
                }
                request.set_value(Value::Integer(request.index() as i32));
            }
            Ok(Dispatch::Complete)
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Modes seen by the handler called `name`, in call order.
    pub fn modes_of(&self, name: &str) -> Vec<Mode> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.handler == name)
            .map(|c| c.mode)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.handler == name).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

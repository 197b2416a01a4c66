//! PDU dispatch.
//!
//! The [`Dispatcher`] owns the subtree registry and drives one PDU at a time
//! through the handler chains of the registrations it routes to:
//!
//! - GET: each varbind goes to the registration with the longest root
//!   containing it.
//! - GETNEXT/GETBULK: as GET, falling back to the next registered subtree when
//!   a chain leaves a varbind unanswered, and ending with `endOfMibView`.
//! - SET: the six-phase transaction in [`Dispatcher::process_set`].
//!
//! Requests routed to the same registration are handed to its chain as one
//! batch; the response keeps the original varbind order.
//!
//! # Example
//!
//! ```rust
//! use snmp_dispatch::agent::Dispatcher;
//! use snmp_dispatch::handler::{AgentRequestInfo, Dispatch, Handler, HandlerRegistration, Mode};
//! use snmp_dispatch::{Value, VarBind, oid};
//!
//! # async fn example() -> snmp_dispatch::Result<()> {
//! let dispatcher = Dispatcher::new();
//! let leaf = Handler::from_fn("sysDescr", |_ctx, _reqinfo, requests| {
//!     for request in requests.iter_mut() {
//!         request.set_value(Value::from("demo agent"));
//!     }
//!     Ok(Dispatch::Complete)
//! });
//! dispatcher.register_handler(HandlerRegistration::new(
//!     "sysDescr",
//!     oid!(1, 3, 6, 1, 2, 1, 1, 1),
//!     leaf,
//! ))?;
//!
//! let mut reqinfo = AgentRequestInfo::new(Mode::Get);
//! let response = dispatcher
//!     .process(&mut reqinfo, vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))])
//!     .await;
//! assert!(response.error_status.is_ok());
//! # Ok(())
//! # }
//! ```

mod delegation;
mod registry;
mod set_handler;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, ErrorStatus, Result};
use crate::handler::{
    AgentRequestInfo, AlarmQueue, HandlerRegistration, HandlerResult, Mode, Request, call_handlers,
};
use crate::oid::Oid;
use crate::value::{Exception, Value};
use crate::varbind::VarBind;

pub use registry::{OidRegistry, SubtreeRegistry};

/// Outcome of one PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub error_status: ErrorStatus,
    /// 1-based position of the failing varbind, 0 when the PDU succeeded.
    pub error_index: usize,
    pub varbinds: Vec<VarBind>,
}

/// Registers handler chains and dispatches PDUs to them.
pub struct Dispatcher {
    registry: RwLock<Box<dyn SubtreeRegistry>>,
}

impl Dispatcher {
    /// A dispatcher with an empty [`OidRegistry`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Publish `registration` under its root OID.
    ///
    /// The chain must be complete: inject helpers with
    /// [`HandlerRegistration::inject`] before calling this.
    pub fn register_handler(
        &self,
        registration: HandlerRegistration,
    ) -> Result<Arc<HandlerRegistration>> {
        if registration.handlers().is_empty() {
            return Err(Error::RegistrationFailed {
                name: registration.name().to_string(),
                reason: "handler chain is empty",
            });
        }
        if registration.root().is_empty() {
            return Err(Error::RegistrationFailed {
                name: registration.name().to_string(),
                reason: "root OID is empty",
            });
        }
        if registration.range_subid() > registration.root().len() {
            return Err(Error::RegistrationFailed {
                name: registration.name().to_string(),
                reason: "range sub-identifier is past the end of the root OID",
            });
        }

        let registration = Arc::new(registration);
        self.registry.write().register(Arc::clone(&registration))?;
        tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::DEBUG,
            snmp.registration = %registration.name(),
            snmp.oid = %registration.root(),
            snmp.handler_count = registration.handlers().len(),
            "registered handler chain"
        );
        Ok(registration)
    }

    /// Remove a registration published under `root` in `context`.
    pub fn unregister_handler(
        &self,
        context: Option<&str>,
        root: &Oid,
        name: &str,
    ) -> Option<Arc<HandlerRegistration>> {
        let removed = self.registry.write().unregister(context, root, name);
        if removed.is_some() {
            tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::DEBUG,
                snmp.registration = name,
                snmp.oid = %root,
                "unregistered handler chain"
            );
        }
        removed
    }

    /// The registration a GET for `oid` would be routed to.
    pub fn find_registration(
        &self,
        context: Option<&str>,
        oid: &Oid,
    ) -> Option<Arc<HandlerRegistration>> {
        self.registry.read().find(context, oid)
    }

    pub fn registration_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Process one PDU in the mode set on `reqinfo`.
    ///
    /// Any SET mode runs the full SET transaction. `reqinfo.mode` is the same
    /// on return as on entry.
    pub async fn process(
        &self,
        reqinfo: &mut AgentRequestInfo,
        varbinds: Vec<VarBind>,
    ) -> Response {
        let mode = reqinfo.mode();
        tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::DEBUG,
            snmp.request_id = reqinfo.request_id,
            snmp.mode = %mode,
            snmp.varbind_count = varbinds.len(),
            "processing PDU"
        );

        if mode.is_set() {
            let response = self.process_set(reqinfo, varbinds).await;
            reqinfo.set_mode(mode);
            return response;
        }

        let mut slots = into_slots(varbinds);
        let failure = if mode == Mode::Get {
            self.process_get(reqinfo, &mut slots).await
        } else {
            self.process_getnext(reqinfo, &mut slots).await
        };
        reqinfo.set_mode(mode);
        into_response(slots, failure)
    }

    async fn process_get(
        &self,
        reqinfo: &mut AgentRequestInfo,
        slots: &mut [Option<Request>],
    ) -> Option<(ErrorStatus, usize)> {
        let context = reqinfo.context().map(str::to_string);
        let mut routes = Vec::new();
        for request in slots.iter_mut().flatten() {
            match self.find_registration(context.as_deref(), request.oid()) {
                Some(registration) => routes.push((request.index(), registration)),
                None => request.set_exception(Mode::Get, Exception::NoSuchObject),
            }
        }

        let failure = self.dispatch_pass(reqinfo, slots, &routes).await;

        for request in slots.iter_mut().flatten() {
            if !request.is_processed() && request.value() == &Value::Null {
                request.set_exception(Mode::Get, Exception::NoSuchInstance);
            }
        }
        failure
    }

    async fn process_getnext(
        &self,
        reqinfo: &mut AgentRequestInfo,
        slots: &mut [Option<Request>],
    ) -> Option<(ErrorStatus, usize)> {
        let context = reqinfo.context().map(str::to_string);
        let originals: Vec<Oid> = slots
            .iter()
            .flatten()
            .map(|r| r.oid().clone())
            .collect();

        let mut routes = Vec::new();
        {
            let registry = self.registry.read();
            for request in slots.iter_mut().flatten() {
                let oid = request.oid();
                match registry
                    .find(context.as_deref(), oid)
                    .or_else(|| registry.find_next(context.as_deref(), oid))
                {
                    Some(registration) => routes.push((request.index(), registration)),
                    None => end_of_view(request, &originals),
                }
            }
        }

        while !routes.is_empty() {
            if let Some(failure) = self.dispatch_pass(reqinfo, slots, &routes).await {
                return Some(failure);
            }

            // Anything still unanswered moves on to the following subtree.
            let registry = self.registry.read();
            let mut next_routes = Vec::new();
            for (position, registration) in routes {
                let Some(request) = slots[position].as_mut() else {
                    continue;
                };
                if request.is_processed() {
                    continue;
                }
                request.varbind.oid = originals[position].clone();
                match registry.find_next(context.as_deref(), registration.root()) {
                    Some(next) => {
                        tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::TRACE,
                            snmp.oid = %request.oid(),
                            snmp.registration = %next.name(),
                            "walking to next subtree"
                        );
                        next_routes.push((position, next));
                    }
                    None => end_of_view(request, &originals),
                }
            }
            routes = next_routes;
        }
        None
    }

    /// Run one pass of `reqinfo.mode` over the routed requests.
    ///
    /// Calls each registration's chain once with its batch, then resumes every
    /// delegated batch before returning. Returns the first failure in varbind
    /// order, if any.
    async fn dispatch_pass(
        &self,
        reqinfo: &mut AgentRequestInfo,
        slots: &mut [Option<Request>],
        routes: &[(usize, Arc<HandlerRegistration>)],
    ) -> Option<(ErrorStatus, usize)> {
        let mut alarms = AlarmQueue::new();
        let mut aborted: Option<(ErrorStatus, usize)> = None;

        for (registration, positions) in group_routes(routes) {
            let mut batch = take_batch(slots, &positions);
            let result = call_handlers(&registration, reqinfo, &mut batch);
            put_back(slots, batch);
            self.absorb(&registration, result, &positions, &mut alarms, &mut aborted);
        }

        if !alarms.is_empty() {
            self.run_alarms(reqinfo, slots, &mut alarms, &mut aborted)
                .await;
        }

        first_failure(slots, aborted)
    }

    /// Record the outcome of one chain call.
    fn absorb(
        &self,
        registration: &HandlerRegistration,
        result: HandlerResult,
        positions: &[usize],
        alarms: &mut AlarmQueue,
        aborted: &mut Option<(ErrorStatus, usize)>,
    ) {
        match result {
            Ok(dispatch) => {
                for token in dispatch.into_continuations() {
                    alarms.register_alarm(token);
                }
            }
            Err(status) => {
                tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::DEBUG,
                    snmp.registration = %registration.name(),
                    snmp.error_status = %status,
                    "handler chain aborted"
                );
                if aborted.is_none()
                    && let Some(&first) = positions.first()
                {
                    *aborted = Some((status, first));
                }
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registrations", &self.registration_count())
            .finish()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    registry: Option<Box<dyn SubtreeRegistry>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self { registry: None }
    }

    /// Use `registry` instead of an empty [`OidRegistry`].
    pub fn registry(mut self, registry: impl SubtreeRegistry + 'static) -> Self {
        self.registry = Some(Box::new(registry));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: RwLock::new(
                self.registry
                    .unwrap_or_else(|| Box::new(OidRegistry::new())),
            ),
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn into_slots(varbinds: Vec<VarBind>) -> Vec<Option<Request>> {
    varbinds
        .into_iter()
        .enumerate()
        .map(|(index, varbind)| Some(Request::new(index, varbind)))
        .collect()
}

fn into_response(slots: Vec<Option<Request>>, failure: Option<(ErrorStatus, usize)>) -> Response {
    let varbinds = slots
        .into_iter()
        .flatten()
        .map(|mut request| {
            request.finish();
            request.varbind.clone()
        })
        .collect();
    let (error_status, error_index) = match failure {
        Some((status, position)) => {
            tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::WARN,
                snmp.error_status = %status,
                snmp.error_index = position + 1,
                "PDU failed"
            );
            (status, position + 1)
        }
        None => (ErrorStatus::NoError, 0),
    };
    Response {
        error_status,
        error_index,
        varbinds,
    }
}

fn end_of_view(request: &mut Request, originals: &[Oid]) {
    let oid = originals[request.index()].clone();
    request.varbind = VarBind::exception(oid, Exception::EndOfMibView);
    request.mark_processed();
}

/// Group routed positions by registration, in order of first appearance.
fn group_routes(
    routes: &[(usize, Arc<HandlerRegistration>)],
) -> Vec<(Arc<HandlerRegistration>, Vec<usize>)> {
    let mut groups: Vec<(Arc<HandlerRegistration>, Vec<usize>)> = Vec::new();
    for (position, registration) in routes {
        match groups
            .iter_mut()
            .find(|(r, _)| Arc::ptr_eq(r, registration))
        {
            Some((_, positions)) => positions.push(*position),
            None => groups.push((Arc::clone(registration), vec![*position])),
        }
    }
    groups
}

fn take_batch(slots: &mut [Option<Request>], positions: &[usize]) -> Vec<Request> {
    positions
        .iter()
        .filter_map(|&p| slots.get_mut(p).and_then(Option::take))
        .collect()
}

fn put_back(slots: &mut [Option<Request>], batch: Vec<Request>) {
    for request in batch {
        let index = request.index();
        slots[index] = Some(request);
    }
}

/// The first failing varbind, preferring per-request statuses over a chain abort.
fn first_failure(
    slots: &[Option<Request>],
    aborted: Option<(ErrorStatus, usize)>,
) -> Option<(ErrorStatus, usize)> {
    slots
        .iter()
        .flatten()
        .find(|r| !r.status().is_ok())
        .map(|r| (r.status(), r.index()))
        .or(aborted)
}

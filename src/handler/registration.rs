//! Handlers, registrations and chain invocation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, ErrorStatus};
use crate::oid::Oid;

use super::{AgentRequestInfo, ContinuationToken, HandlerResult, MibHandler, Request};

/// Default registration priority (lower values win among equal roots).
pub const DEFAULT_PRIORITY: u8 = 127;

/// A named node of a handler chain.
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    node: Arc<dyn MibHandler>,
}

impl Handler {
    pub fn new(name: impl Into<Arc<str>>, node: impl MibHandler) -> Self {
        Self {
            name: name.into(),
            node: Arc::new(node),
        }
    }

    /// Wrap a shared handler, e.g. one also reachable from a multiplexer.
    pub fn from_arc(name: impl Into<Arc<str>>, node: Arc<dyn MibHandler>) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }

    /// Build a handler from a closure with the callback signature.
    pub fn from_fn<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&HandlerCtx<'_>, &mut AgentRequestInfo, &mut [Request]) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, f)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &Arc<dyn MibHandler> {
        &self.node
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// A handler chain bound to a root OID.
///
/// Built once with [`HandlerRegistration::builder`], optionally extended with
/// [`inject`](HandlerRegistration::inject), then handed to the dispatcher,
/// after which it is shared immutably.
#[derive(Debug)]
pub struct HandlerRegistration {
    name: String,
    context: Option<String>,
    root: Oid,
    priority: u8,
    range_subid: usize,
    range_ubound: u32,
    timeout: Option<Duration>,
    handlers: Vec<Handler>,
}

impl HandlerRegistration {
    /// Start building a registration for `root`.
    pub fn builder(name: impl Into<String>, root: Oid) -> RegistrationBuilder {
        RegistrationBuilder {
            registration: HandlerRegistration {
                name: name.into(),
                context: None,
                root,
                priority: DEFAULT_PRIORITY,
                range_subid: 0,
                range_ubound: 0,
                timeout: None,
                handlers: Vec::new(),
            },
        }
    }

    /// A registration with a single handler and default settings.
    pub fn new(name: impl Into<String>, root: Oid, handler: Handler) -> Self {
        Self::builder(name, root).handler(handler).build()
    }

    /// Prepend `handler` to the chain, so it runs before every handler already present.
    pub fn inject(&mut self, handler: Handler) {
        tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::DEBUG,
            snmp.registration = %self.name,
            snmp.handler = %handler.name(),
            "injecting handler"
        );
        self.handlers.insert(0, handler);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn root(&self) -> &Oid {
        &self.root
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// 1-based arc position that may vary up to [`range_ubound`](Self::range_ubound); 0 if unranged.
    pub fn range_subid(&self) -> usize {
        self.range_subid
    }

    pub fn range_ubound(&self) -> u32 {
        self.range_ubound
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The chain in call order.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Names of the chain in call order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(Handler::name).collect()
    }

    /// Returns `true` if `oid` lies in the subtree (or subtree range) of this registration.
    pub fn contains(&self, oid: &Oid) -> bool {
        if self.range_subid == 0 {
            return oid.starts_with(&self.root);
        }
        let pos = self.range_subid - 1;
        let root = self.root.arcs();
        let arcs = oid.arcs();
        if arcs.len() < root.len() {
            return false;
        }
        root.iter().zip(arcs).enumerate().all(|(i, (r, a))| {
            if i == pos {
                *a >= *r && *a <= self.range_ubound
            } else {
                r == a
            }
        })
    }
}

/// Builder for [`HandlerRegistration`].
pub struct RegistrationBuilder {
    registration: HandlerRegistration,
}

impl RegistrationBuilder {
    /// Register in a named context instead of the default one.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.registration.context = Some(context.into());
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.registration.priority = priority;
        self
    }

    /// Let arc `subid` (1-based) of the root range from its root value to `ubound`.
    pub fn range(mut self, subid: usize, ubound: u32) -> Self {
        self.registration.range_subid = subid;
        self.registration.range_ubound = ubound;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.registration.timeout = Some(timeout);
        self
    }

    /// Append a handler; the chain runs in the order handlers are added.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.registration.handlers.push(handler);
        self
    }

    pub fn build(self) -> HandlerRegistration {
        self.registration
    }
}

/// Position of the running handler within its chain.
///
/// Passed to every [`MibHandler::handle`] call; used to reach the next handler
/// and to capture continuations.
pub struct HandlerCtx<'a> {
    registration: &'a Arc<HandlerRegistration>,
    chain: &'a [Handler],
    position: usize,
}

impl<'a> HandlerCtx<'a> {
    pub fn registration(&self) -> &'a Arc<HandlerRegistration> {
        self.registration
    }

    /// The handler currently running.
    pub fn handler(&self) -> &'a Handler {
        &self.chain[self.position]
    }

    /// Root OID of the registration.
    pub fn root(&self) -> &'a Oid {
        self.registration.root()
    }

    /// Invoke the next handler of the chain.
    ///
    /// Fails with `genErr` if the running handler is the last one.
    pub fn call_next(
        &self,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        call_at(
            self.registration,
            self.chain,
            self.position + 1,
            reqinfo,
            requests,
        )
    }

    /// Defer completion of every unprocessed request in `requests`.
    ///
    /// Marks them delegated and captures a continuation that resumes this
    /// handler with `state`. Return it as
    /// [`Dispatch::suspended`](super::Dispatch::suspended).
    pub fn delegate<S: Any + Send>(
        &self,
        reqinfo: &AgentRequestInfo,
        requests: &mut [Request],
        state: S,
    ) -> ContinuationToken {
        let mut positions = Vec::new();
        for request in requests.iter_mut().filter(|r| !r.is_processed()) {
            request.set_delegated(true);
            positions.push(request.index());
        }
        tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::DEBUG,
            snmp.registration = %self.registration.name(),
            snmp.handler = %self.handler().name(),
            snmp.varbind_count = positions.len(),
            "delegating requests"
        );
        ContinuationToken::new(
            self.handler().clone(),
            Arc::clone(self.registration),
            reqinfo.mode(),
            positions,
            Box::new(state),
        )
    }
}

/// Invoke the chain of `registration` from its head.
///
/// Fails with `genErr` if the chain is empty or there are no requests.
pub fn call_handlers(
    registration: &Arc<HandlerRegistration>,
    reqinfo: &mut AgentRequestInfo,
    requests: &mut [Request],
) -> HandlerResult {
    call_chain(registration, registration.handlers(), reqinfo, requests)
}

/// Invoke `chain` from its head on behalf of `registration`.
///
/// The chain need not be the registration's own; multiplexers use this for
/// their per-mode sub-chains.
pub fn call_chain(
    registration: &Arc<HandlerRegistration>,
    chain: &[Handler],
    reqinfo: &mut AgentRequestInfo,
    requests: &mut [Request],
) -> HandlerResult {
    call_at(registration, chain, 0, reqinfo, requests)
}

fn call_at(
    registration: &Arc<HandlerRegistration>,
    chain: &[Handler],
    position: usize,
    reqinfo: &mut AgentRequestInfo,
    requests: &mut [Request],
) -> HandlerResult {
    let Some(handler) = chain.get(position) else {
        let err = Error::MissingHandler {
            registration: registration.name().to_string(),
            position,
        };
        tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::ERROR,
            error = %err,
            "handler chain ended early"
        );
        return Err(ErrorStatus::GenErr);
    };
    if requests.is_empty() {
        tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::ERROR,
            snmp.registration = %registration.name(),
            snmp.handler = %handler.name(),
            "handler called without requests"
        );
        return Err(ErrorStatus::GenErr);
    }

    tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::TRACE,
        snmp.registration = %registration.name(),
        snmp.handler = %handler.name(),
        snmp.mode = %reqinfo.mode(),
        snmp.varbind_count = requests.len(),
        "calling handler"
    );

    let ctx = HandlerCtx {
        registration,
        chain,
        position,
    };
    handler.node().handle(&ctx, reqinfo, requests)
}

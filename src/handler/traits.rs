//! MibHandler trait.

use std::any::Any;

use crate::error::ErrorStatus;

use super::{AgentRequestInfo, HandlerCtx, HandlerRegistration, HandlerResult, Request};

/// A node of a handler chain.
///
/// [`handle`](MibHandler::handle) is invoked once per PDU for each mode (or
/// SET phase) with every request routed to the registration. A helper applies
/// its policy and forwards with [`HandlerCtx::call_next`]; a leaf answers the
/// requests itself.
///
/// Handlers skip requests that are already [processed](Request::is_processed).
///
/// # Example
///
/// ```rust
/// use snmp_dispatch::handler::{
///     AgentRequestInfo, Dispatch, HandlerCtx, HandlerResult, MibHandler, Mode, Request,
/// };
/// use snmp_dispatch::{ErrorStatus, Value};
///
/// struct Uptime(u32);
///
/// impl MibHandler for Uptime {
///     fn handle(
///         &self,
///         _ctx: &HandlerCtx<'_>,
///         reqinfo: &mut AgentRequestInfo,
///         requests: &mut [Request],
///     ) -> HandlerResult {
///         for request in requests.iter_mut().filter(|r| !r.is_processed()) {
///             match reqinfo.mode() {
///                 Mode::Get => request.set_value(Value::TimeTicks(self.0)),
///                 _ => request.set_error(ErrorStatus::NotWritable),
///             }
///         }
///         Ok(Dispatch::Complete)
///     }
/// }
/// ```
///
/// # Bounds
///
/// Handlers are shared as `Arc<dyn MibHandler>` between the registration that
/// owns the chain and any continuation captured from it, hence `Send + Sync +
/// 'static`.
pub trait MibHandler: Send + Sync + 'static {
    /// Process `requests` in the mode given by `reqinfo`.
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult;

    /// Complete requests this handler delegated earlier.
    ///
    /// Called with the mode saved in the continuation and the `state` passed to
    /// [`HandlerCtx::delegate`]. The handler clears the delegated flag of every
    /// request it completes.
    ///
    /// Default implementation reports `genErr`: a handler that never delegates
    /// must never be resumed.
    fn resume(
        &self,
        registration: &HandlerRegistration,
        _reqinfo: &mut AgentRequestInfo,
        _requests: &mut [Request],
        _state: Box<dyn Any + Send>,
    ) -> HandlerResult {
        tracing::event!(
                target: "snmp_dispatch::handler",
                tracing::Level::ERROR,
            snmp.registration = %registration.name(),
            "resume called on a handler that does not delegate"
        );
        Err(ErrorStatus::GenErr)
    }
}

impl<F> MibHandler for F
where
    F: Fn(&HandlerCtx<'_>, &mut AgentRequestInfo, &mut [Request]) -> HandlerResult
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        self(ctx, reqinfo, requests)
    }
}

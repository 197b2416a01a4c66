//! Single-instance helper.

use std::slice;

use crate::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerRegistration, HandlerResult,
    MibHandler, Mode, Request,
};
use crate::oid::Oid;
use crate::value::Exception;

use super::ReadOnly;

/// Restricts a registration to exactly its root OID.
///
/// - GET and SET phases forward only requests naming the root; others get
///   `noSuchObject`. A SET has no exception values, so there the miss is
///   reported through [`Request::set_exception`] as the `noCreation` error
///   status, as RFC 3416 prescribes for a variable that cannot be created.
/// - GETNEXT/GETBULK below the root are rewritten to the root and forwarded as
///   GET; anything at or past the root is left for the next subtree.
///
/// Requests are forwarded one at a time since the mode may differ per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Instance;

impl Instance {
    pub fn handler() -> Handler {
        Handler::new("instance", Instance)
    }
}

impl MibHandler for Instance {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let root = ctx.root();
        let mut dispatch = Dispatch::Complete;

        for request in requests.iter_mut() {
            if request.is_processed() {
                continue;
            }
            let mode = reqinfo.mode();
            match mode {
                Mode::GetNext | Mode::GetBulk => {
                    if request.oid() >= root {
                        continue;
                    }
                    request.varbind.oid = root.clone();
                    let saved = reqinfo.set_mode(Mode::Get);
                    let result = ctx.call_next(reqinfo, slice::from_mut(request));
                    reqinfo.set_mode(saved);
                    dispatch = dispatch.merge(result?);
                }
                _ => {
                    if request.oid() != root {
                        tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::TRACE,
                            snmp.oid = %request.oid(),
                            snmp.mode = %mode,
                            "request does not name the instance"
                        );
                        request.set_exception(mode, Exception::NoSuchObject);
                        continue;
                    }
                    dispatch = dispatch.merge(ctx.call_next(reqinfo, slice::from_mut(request))?);
                }
            }
        }
        Ok(dispatch)
    }
}

/// A registration for the single instance `oid` answered by `leaf`.
pub fn instance_registration(name: impl Into<String>, oid: Oid, leaf: Handler) -> HandlerRegistration {
    let mut registration = HandlerRegistration::new(name, oid, leaf);
    registration.inject(Instance::handler());
    registration
}

/// As [`instance_registration`], rejecting every SET with `notWritable`.
pub fn read_only_instance_registration(
    name: impl Into<String>,
    oid: Oid,
    leaf: Handler,
) -> HandlerRegistration {
    let mut registration = HandlerRegistration::new(name, oid, leaf);
    registration.inject(ReadOnly::handler());
    registration.inject(Instance::handler());
    registration
}

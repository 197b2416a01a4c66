//! One-request-at-a-time forwarding.

use std::slice;

use crate::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerResult, MibHandler, Request,
};

/// Calls the rest of the chain once per unprocessed request.
///
/// Lets leaf handlers that only understand a single varbind sit behind
/// helpers that batch. The first call returning an error status stops the
/// loop and that status is returned; later requests are not visited.
#[derive(Debug, Default, Clone, Copy)]
pub struct Serialize;

impl Serialize {
    pub fn handler() -> Handler {
        Handler::new("serialize", Serialize)
    }
}

impl MibHandler for Serialize {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let mut dispatch = Dispatch::Complete;
        for request in requests.iter_mut().filter(|r| !r.is_processed()) {
            dispatch = dispatch.merge(ctx.call_next(reqinfo, slice::from_mut(request))?);
        }
        Ok(dispatch)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ErrorStatus;
    use crate::handler::{HandlerRegistration, Mode, call_handlers};
    use crate::oid;
    use crate::value::Value;
    use crate::varbind::VarBind;

    #[test]
    fn test_serialize_skips_processed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let leaf = Handler::from_fn("leaf", move |_ctx, _reqinfo, requests| {
            counted.fetch_add(1, Ordering::SeqCst);
            assert_eq!(requests.len(), 1);
            requests[0].set_value(Value::Integer(1));
            Ok(Dispatch::Complete)
        });
        let mut reg = HandlerRegistration::new("s", oid!(1, 3, 6, 1, 4, 1, 6), leaf);
        reg.inject(Serialize::handler());
        let reg = Arc::new(reg);

        let mut requests: Vec<Request> = (0..3)
            .map(|i| Request::new(i, VarBind::null(oid!(1, 3, 6, 1, 4, 1, 6, i as u32))))
            .collect();
        requests[1].set_error(ErrorStatus::NoAccess);

        let mut reqinfo = AgentRequestInfo::new(Mode::Get);
        call_handlers(&reg, &mut reqinfo, &mut requests).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(requests[1].value(), &Value::Null);
    }
}

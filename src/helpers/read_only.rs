//! Write-rejecting helpers.

use crate::error::ErrorStatus;
use crate::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerResult, MibHandler, Request,
};

fn reject_set(requests: &mut [Request]) -> HandlerResult {
    for request in requests.iter_mut() {
        request.set_error(ErrorStatus::NotWritable);
    }
    Err(ErrorStatus::NotWritable)
}

/// Fails every SET phase with `notWritable`; reads pass through.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnly;

impl ReadOnly {
    pub fn handler() -> Handler {
        Handler::new("read_only", ReadOnly)
    }
}

impl MibHandler for ReadOnly {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        if reqinfo.mode().is_set() {
            return reject_set(requests);
        }
        ctx.call_next(reqinfo, requests)
    }
}

/// Terminates a chain: reads succeed without answering, SETs fail.
///
/// Useful as a placeholder leaf while a subtree is reserved but not populated.
#[derive(Debug, Default, Clone, Copy)]
pub struct Null;

impl Null {
    pub fn handler() -> Handler {
        Handler::new("null", Null)
    }
}

impl MibHandler for Null {
    fn handle(
        &self,
        _ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        if reqinfo.mode().is_set() {
            return reject_set(requests);
        }
        Ok(Dispatch::Complete)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handler::{HandlerRegistration, Mode, call_handlers};
    use crate::oid;
    use crate::value::Value;
    use crate::varbind::VarBind;

    fn run(head: Handler, mode: Mode) -> (HandlerResult, Request) {
        let leaf = Handler::from_fn("leaf", |_ctx, _reqinfo, requests| {
            requests[0].set_value(Value::Integer(3));
            Ok(Dispatch::Complete)
        });
        let mut reg = HandlerRegistration::new("ro", oid!(1, 3, 6, 1, 4, 1, 2), leaf);
        reg.inject(head);
        let reg = Arc::new(reg);
        let mut reqinfo = AgentRequestInfo::new(mode);
        let mut requests = vec![Request::new(0, VarBind::null(oid!(1, 3, 6, 1, 4, 1, 2, 0)))];
        let result = call_handlers(&reg, &mut reqinfo, &mut requests);
        (result, requests.remove(0))
    }

    #[test]
    fn test_read_only() {
        let (result, request) = run(ReadOnly::handler(), Mode::Get);
        assert!(result.is_ok());
        assert_eq!(request.value(), &Value::Integer(3));

        for mode in [Mode::SetReserve1, Mode::SetAction, Mode::SetFree] {
            let (result, request) = run(ReadOnly::handler(), mode);
            assert_eq!(result.unwrap_err(), ErrorStatus::NotWritable);
            assert_eq!(request.status(), ErrorStatus::NotWritable);
        }
    }

    #[test]
    fn test_null_answers_nothing() {
        let (result, request) = run(Null::handler(), Mode::GetNext);
        assert!(result.is_ok());
        assert!(!request.is_processed());
        assert_eq!(request.value(), &Value::Null);

        let (result, _) = run(Null::handler(), Mode::SetReserve2);
        assert_eq!(result.unwrap_err(), ErrorStatus::NotWritable);
    }
}

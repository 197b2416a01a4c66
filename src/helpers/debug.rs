//! Chain tracing helper.

use crate::handler::{AgentRequestInfo, Handler, HandlerCtx, HandlerResult, MibHandler, Request};

/// Logs every pass through its position in the chain, then forwards.
///
/// Varbinds are logged at `trace`, the pass and its outcome at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugHandler;

impl DebugHandler {
    pub fn handler() -> Handler {
        Handler::new("debug", DebugHandler)
    }
}

impl MibHandler for DebugHandler {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let registration = ctx.registration().name();
        tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::DEBUG,
            snmp.registration = %registration,
            snmp.mode = %reqinfo.mode(),
            snmp.varbind_count = requests.len(),
            "entering handler chain"
        );
        for request in requests.iter() {
            tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::TRACE,
                snmp.registration = %registration,
                snmp.varbind = %request.varbind,
                processed = request.is_processed(),
                "request"
            );
        }

        let result = ctx.call_next(reqinfo, requests);

        match &result {
            Ok(dispatch) => tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::DEBUG,
                snmp.registration = %registration,
                snmp.mode = %reqinfo.mode(),
                complete = dispatch.is_complete(),
                "handler chain returned"
            ),
            Err(status) => tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::DEBUG,
                snmp.registration = %registration,
                snmp.mode = %reqinfo.mode(),
                snmp.error_status = %status,
                "handler chain failed"
            ),
        }
        for request in requests.iter() {
            tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::TRACE,
                snmp.registration = %registration,
                snmp.varbind = %request.varbind,
                snmp.error_status = %request.status(),
                "request after chain"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handler::{Dispatch, HandlerRegistration, Mode, call_handlers};
    use crate::oid;
    use crate::value::Value;
    use crate::varbind::VarBind;

    #[test]
    fn test_debug_is_transparent() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("snmp_dispatch=trace")
            .with_test_writer()
            .try_init();

        let leaf = Handler::from_fn("leaf", |_ctx, _reqinfo, requests| {
            requests[0].set_value(Value::Integer(8));
            Ok(Dispatch::Complete)
        });
        let mut reg = HandlerRegistration::new("d", oid!(1, 3, 6, 1, 4, 1, 9), leaf);
        reg.inject(DebugHandler::handler());
        let reg = Arc::new(reg);

        let mut reqinfo = AgentRequestInfo::new(Mode::Get);
        let mut requests = vec![Request::new(0, VarBind::null(oid!(1, 3, 6, 1, 4, 1, 9, 0)))];
        call_handlers(&reg, &mut reqinfo, &mut requests).unwrap();
        assert_eq!(requests[0].value(), &Value::Integer(8));
    }
}

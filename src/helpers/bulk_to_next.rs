//! GETBULK to GETNEXT conversion.

use crate::handler::{
    AgentRequestInfo, Handler, HandlerCtx, HandlerResult, MibHandler, Mode, Request,
};

/// Presents GETBULK passes to the rest of the chain as GETNEXT.
///
/// Repetition handling stays with the PDU layer, which calls the chain once
/// per repetition; handlers below this helper only need to implement GETNEXT.
#[derive(Debug, Default, Clone, Copy)]
pub struct BulkToNext;

impl BulkToNext {
    pub fn handler() -> Handler {
        Handler::new("bulk_to_next", BulkToNext)
    }
}

impl MibHandler for BulkToNext {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        if reqinfo.mode() != Mode::GetBulk {
            return ctx.call_next(reqinfo, requests);
        }
        let saved = reqinfo.set_mode(Mode::GetNext);
        let result = ctx.call_next(reqinfo, requests);
        reqinfo.set_mode(saved);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handler::{Dispatch, HandlerRegistration, call_handlers};
    use crate::oid;
    use crate::varbind::VarBind;

    #[test]
    fn test_bulk_seen_as_next_and_restored() {
        let leaf = Handler::from_fn("leaf", |_ctx, reqinfo, _requests| {
            assert_eq!(reqinfo.mode(), Mode::GetNext);
            Ok(Dispatch::Complete)
        });
        let mut reg = HandlerRegistration::new("b", oid!(1, 3, 6, 1, 4, 1, 8), leaf);
        reg.inject(BulkToNext::handler());
        let reg = Arc::new(reg);

        let mut reqinfo = AgentRequestInfo::new(Mode::GetBulk);
        let mut requests = vec![Request::new(0, VarBind::null(oid!(1, 3, 6, 1, 4, 1, 8)))];
        call_handlers(&reg, &mut reqinfo, &mut requests).unwrap();
        assert_eq!(reqinfo.mode(), Mode::GetBulk);
    }
}

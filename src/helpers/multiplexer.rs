//! Per-mode dispatch to sub-chains.

use crate::error::ErrorStatus;
use crate::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerResult, MibHandler, Mode, Request,
    call_chain,
};

/// Sends each mode to its own sub-chain instead of the next handler.
///
/// GETNEXT falls back to the GET chain and GETBULK to the GETNEXT chain, then
/// the GET chain. SET phases without a SET chain fail with `notWritable`.
#[derive(Debug, Default, Clone)]
pub struct Multiplexer {
    get: Option<Vec<Handler>>,
    getnext: Option<Vec<Handler>>,
    getbulk: Option<Vec<Handler>>,
    set: Option<Vec<Handler>>,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain for GET (and the fallback for GETNEXT and GETBULK).
    pub fn get(mut self, chain: impl IntoIterator<Item = Handler>) -> Self {
        self.get = Some(chain.into_iter().collect());
        self
    }

    pub fn getnext(mut self, chain: impl IntoIterator<Item = Handler>) -> Self {
        self.getnext = Some(chain.into_iter().collect());
        self
    }

    pub fn getbulk(mut self, chain: impl IntoIterator<Item = Handler>) -> Self {
        self.getbulk = Some(chain.into_iter().collect());
        self
    }

    /// Chain for all six SET phases.
    pub fn set(mut self, chain: impl IntoIterator<Item = Handler>) -> Self {
        self.set = Some(chain.into_iter().collect());
        self
    }

    pub fn into_handler(self) -> Handler {
        Handler::new("multiplexer", self)
    }

    fn select(&self, mode: Mode) -> Option<&[Handler]> {
        let chain = match mode {
            Mode::Get => self.get.as_ref(),
            Mode::GetNext => self.getnext.as_ref().or(self.get.as_ref()),
            Mode::GetBulk => self
                .getbulk
                .as_ref()
                .or(self.getnext.as_ref())
                .or(self.get.as_ref()),
            _ => self.set.as_ref(),
        };
        chain.map(Vec::as_slice)
    }
}

impl MibHandler for Multiplexer {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let mode = reqinfo.mode();
        match self.select(mode) {
            Some(chain) => call_chain(ctx.registration(), chain, reqinfo, requests),
            None if mode.is_set() => {
                for request in requests.iter_mut() {
                    request.set_error(ErrorStatus::NotWritable);
                }
                Ok(Dispatch::Complete)
            }
            None => {
                tracing::event!(
                target: "snmp_dispatch::helpers",
                tracing::Level::ERROR,
                    snmp.registration = %ctx.registration().name(),
                    snmp.mode = %mode,
                    "multiplexer has no handler for mode"
                );
                Err(ErrorStatus::GenErr)
            }
        }
    }
}

//! Per-PDU request information passed to handlers.

use std::net::SocketAddr;

use bytes::Bytes;

use super::Mode;

/// Session attributes of the PDU being processed.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Source address of the request, if known.
    pub source: Option<SocketAddr>,
    /// Security name (community string or username).
    pub security_name: Bytes,
    /// Context name (v3 only, empty for v1/v2c).
    pub context_name: Bytes,
}

/// Information shared by every request of one PDU.
///
/// Helpers may rewrite [`mode`](AgentRequestInfo::mode) while calling further
/// down the chain; they must restore it before returning.
#[derive(Debug, Clone)]
pub struct AgentRequestInfo {
    mode: Mode,
    /// Request ID from the PDU.
    pub request_id: i32,
    /// Session the PDU arrived on.
    pub session: Session,
}

impl AgentRequestInfo {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            request_id: 0,
            session: Session::default(),
        }
    }

    pub fn with_request_id(mut self, request_id: i32) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Replace the mode, returning the previous one so it can be restored.
    pub fn set_mode(&mut self, mode: Mode) -> Mode {
        std::mem::replace(&mut self.mode, mode)
    }

    /// Context name as a string, `None` for the default context.
    pub fn context(&self) -> Option<&str> {
        if self.session.context_name.is_empty() {
            None
        } else {
            std::str::from_utf8(&self.session.context_name).ok()
        }
    }
}

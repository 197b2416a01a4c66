//! Handler chains and the types passed along them.
//!
//! A registration binds a chain of [`MibHandler`]s to a root OID. The
//! dispatcher calls the head of the chain once per mode with every request
//! routed to the registration; each helper applies its policy and forwards with
//! [`HandlerCtx::call_next`] until a leaf handler answers.
//!
//! - [`HandlerRegistration`] - Root OID, priority, range and the chain itself
//! - [`Handler`] - A named chain node
//! - [`Request`] - One varbind plus its status, attachments and SET state
//! - [`AgentRequestInfo`] - Mode and session data shared by a PDU
//! - [`ContinuationToken`] - A delegated batch waiting to be resumed
//!
//! # Chain order
//!
//! [`HandlerRegistration::inject`] prepends, so the handler injected last runs
//! first:
//!
//! ```rust
//! use snmp_dispatch::handler::{Dispatch, Handler, HandlerRegistration};
//! use snmp_dispatch::{Value, oid};
//!
//! let leaf = Handler::from_fn("leaf", |_ctx, _reqinfo, requests| {
//!     for request in requests.iter_mut() {
//!         request.set_value(Value::Integer(1));
//!     }
//!     Ok(Dispatch::Complete)
//! });
//! let pass = |name: &'static str| {
//!     Handler::from_fn(name, |ctx, reqinfo, requests| ctx.call_next(reqinfo, requests))
//! };
//!
//! let mut reg = HandlerRegistration::new("demo", oid!(1, 3, 6, 1, 4, 1, 99999), leaf);
//! reg.inject(pass("outer"));
//! reg.inject(pass("outermost"));
//! assert_eq!(reg.handler_names(), ["outermost", "outer", "leaf"]);
//! ```
//!
//! # Errors
//!
//! A handler reports a per-request failure with [`Request::set_error`] and
//! keeps going. Returning `Err(status)` aborts the rest of the chain for the
//! whole batch.

mod attachment;
mod context;
mod delegation;
mod mode;
mod registration;
mod request;
mod results;
mod traits;

pub use attachment::AttachmentList;
pub use context::{AgentRequestInfo, Session};
pub use delegation::{AlarmQueue, ContinuationToken};
pub use mode::Mode;
pub use registration::{
    DEFAULT_PRIORITY, Handler, HandlerCtx, HandlerRegistration, RegistrationBuilder, call_chain,
    call_handlers,
};
pub use request::Request;
pub use results::{Dispatch, HandlerResult};
pub use traits::MibHandler;

//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust
//! use snmp_dispatch::prelude::*;
//! ```
//!
//! This imports:
//! - Core types: [`Oid`], [`Value`], [`VarBind`]
//! - Dispatch: [`Dispatcher`], [`HandlerRegistration`], [`Handler`], [`MibHandler`]
//! - Per-PDU state: [`AgentRequestInfo`], [`Request`], [`Mode`]
//! - Error handling: [`Error`], [`ErrorStatus`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::agent::Dispatcher;
pub use crate::error::{Error, ErrorStatus, Result};
pub use crate::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerRegistration, HandlerResult,
    MibHandler, Mode, Request,
};
pub use crate::oid::Oid;
pub use crate::value::Value;
pub use crate::varbind::VarBind;

#[doc(no_inline)]
pub use crate::oid;

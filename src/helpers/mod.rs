//! Generic helper handlers.
//!
//! Each helper is a [`MibHandler`](crate::handler::MibHandler) that applies one
//! policy and forwards to the rest of the chain. Inject them in front of a
//! leaf handler before registering:
//!
//! ```rust
//! use snmp_dispatch::handler::{Dispatch, Handler, HandlerRegistration};
//! use snmp_dispatch::helpers::{Instance, ReadOnly};
//! use snmp_dispatch::{Value, oid};
//!
//! let leaf = Handler::from_fn("sysName", |_ctx, _reqinfo, requests| {
//!     for request in requests.iter_mut().filter(|r| !r.is_processed()) {
//!         request.set_value(Value::from("router-1"));
//!     }
//!     Ok(Dispatch::Complete)
//! });
//! let mut reg = HandlerRegistration::new("sysName", oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), leaf);
//! reg.inject(ReadOnly::handler());
//! reg.inject(Instance::handler());
//! assert_eq!(reg.handler_names(), ["instance", "read_only", "sysName"]);
//! ```

mod bulk_to_next;
mod debug;
mod instance;
mod multiplexer;
mod read_only;
mod serialize;

pub use bulk_to_next::BulkToNext;
pub use debug::DebugHandler;
pub use instance::{Instance, instance_registration, read_only_instance_registration};
pub use multiplexer::Multiplexer;
pub use read_only::{Null, ReadOnly};
pub use serialize::Serialize;

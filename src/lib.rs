//! # snmp-dispatch
//!
//! Request dispatch for SNMP agents: handler chains bound to OID subtrees,
//! helpers that apply one policy each, table support that turns
//! `<table>.1.<column>.<index>` into rows and columns, and the six-phase SET
//! transaction.
//!
//! The crate sits between a PDU decoder and the instrumentation code. It never
//! touches the network: hand [`agent::Dispatcher::process`] the mode and the
//! varbinds of a decoded PDU and encode the [`agent::Response`] it returns.
//!
//! # Modules
//!
//! - [`handler`] - Registrations, chains and the per-request state they share
//! - [`agent`] - The dispatcher, subtree registry, SET transaction and delegation
//! - [`helpers`] - Instance, multiplexer, serialize, read-only and friends
//! - [`table`] - Table resolution, row arrays and the table data set
//!
//! # Example
//!
//! ```rust
//! use snmp_dispatch::agent::Dispatcher;
//! use snmp_dispatch::handler::{AgentRequestInfo, Mode};
//! use snmp_dispatch::table::{IndexType, TableDataSet};
//! use snmp_dispatch::{Value, ValueType, VarBind, oid};
//!
//! # async fn example() -> snmp_dispatch::Result<()> {
//! let users = TableDataSet::builder()
//!     .index(IndexType::Integer)
//!     .column(2, ValueType::OctetString, true)
//!     .build();
//! let row = users.add_row(&[Value::Integer(1)])?;
//! users.set_value(&row, 2, Value::from("alice")).ok();
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.register_handler(users.registration("users", oid!(1, 3, 6, 1, 4, 1, 99999, 1)))?;
//!
//! let mut reqinfo = AgentRequestInfo::new(Mode::GetNext);
//! let response = dispatcher
//!     .process(&mut reqinfo, vec![VarBind::null(oid!(1, 3, 6, 1, 4, 1, 99999, 1))])
//!     .await;
//! assert_eq!(response.varbinds[0].oid, oid!(1, 3, 6, 1, 4, 1, 99999, 1, 1, 2, 1));
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod oid;
pub mod prelude;
pub mod table;
pub mod value;
pub mod varbind;

pub use error::{Error, ErrorStatus, Result};
pub use oid::Oid;
pub use value::{Exception, Value, ValueType};
pub use varbind::VarBind;

//! Common test fixtures and constants.

use snmp_dispatch::agent::{Dispatcher, Response};
use snmp_dispatch::handler::{AgentRequestInfo, Dispatch, Handler, Mode};
use snmp_dispatch::helpers::read_only_instance_registration;
use snmp_dispatch::table::{
    IndexType, TableArray, TableDataSet, TableRegistrationInfo, table_array_registration,
};
use snmp_dispatch::{Oid, Value, ValueType, VarBind, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// Nonexistent OID for testing NoSuchObject/NoSuchInstance
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

// =============================================================================
// Tables
// =============================================================================

/// Root of the two-index product table.
pub fn product_table() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 8072, 2, 2)
}

/// Root of the data set table used by SET tests.
pub fn data_set_table() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 8072, 2, 4)
}

/// A scalar registered just past the product table.
pub fn trailing_scalar() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 8072, 2, 3, 0)
}

/// `<table>.1.<column>.<index>`
pub fn cell(table: &Oid, column: u32, index: &[u32]) -> Oid {
    let mut oid = table.clone();
    oid.extend_from_slice(&[1, column]).unwrap();
    oid.extend_from_slice(index).unwrap();
    oid
}

/// Rows `(i, j)` for `i, j` in `1..=5`, one column (3) holding `i * j`.
pub fn product_array() -> TableArray<(i32, i32)> {
    let info = TableRegistrationInfo::builder()
        .index(IndexType::Integer)
        .index(IndexType::Integer)
        .columns(3, 3)
        .build();
    let array = TableArray::new(info);
    // Inserted out of order so the first lookup has to sort
    for i in (1..=5).rev() {
        for j in 1..=5 {
            array
                .insert_row(&[Value::Integer(i), Value::Integer(j)], (i, j))
                .unwrap();
        }
    }
    array
}

/// Answers column 3 with the product of the row's two indexes.
pub fn product_leaf() -> Handler {
    Handler::from_fn("product", |_ctx, reqinfo, requests| {
        assert_eq!(reqinfo.mode(), Mode::Get);
        for request in requests.iter_mut().filter(|r| !r.is_processed()) {
            let Some((i, j)) = TableArray::<(i32, i32)>::row(request).map(|row| **row) else {
                continue;
            };
            request.set_value(Value::Integer(i * j));
        }
        Ok(Dispatch::Complete)
    })
}

/// A dispatcher serving the product table, plus the trailing scalar when asked.
pub fn product_dispatcher(with_trailing_scalar: bool) -> Dispatcher {
    let dispatcher = Dispatcher::new();
    let array = product_array();
    dispatcher
        .register_handler(table_array_registration(
            "productTable",
            product_table(),
            &array,
            product_leaf(),
        ))
        .unwrap();
    if with_trailing_scalar {
        let leaf = Handler::from_fn("trailer", |_ctx, _reqinfo, requests| {
            for request in requests.iter_mut().filter(|r| !r.is_processed()) {
                request.set_value(Value::from("after the table"));
            }
            Ok(Dispatch::Complete)
        });
        dispatcher
            .register_handler(read_only_instance_registration(
                "trailer",
                trailing_scalar(),
                leaf,
            ))
            .unwrap();
    }
    dispatcher
}

/// A data set with a writable string column (2), a read-only integer column (3)
/// and a writable integer column (5), and rows 1 to 3 populated.
pub fn accounts(allow_row_creation: bool) -> TableDataSet {
    let set = TableDataSet::builder()
        .index(IndexType::Integer)
        .column(2, ValueType::OctetString, true)
        .column(3, ValueType::Integer, false)
        .column(5, ValueType::Integer, true)
        .allow_row_creation(allow_row_creation)
        .build();
    for row in 1..=3 {
        let index = set.add_row(&[Value::Integer(row)]).unwrap();
        set.set_value(&index, 2, Value::OctetString(format!("user{row}").into()))
            .unwrap();
        set.set_value(&index, 3, Value::Integer(row * 100)).unwrap();
        set.set_value(&index, 5, Value::Integer(row)).unwrap();
    }
    set
}

// =============================================================================
// PDU helpers
// =============================================================================

pub async fn send(dispatcher: &Dispatcher, mode: Mode, varbinds: Vec<VarBind>) -> Response {
    let mut reqinfo = AgentRequestInfo::new(mode);
    let response = dispatcher.process(&mut reqinfo, varbinds).await;
    assert_eq!(reqinfo.mode(), mode);
    response
}

pub async fn get(dispatcher: &Dispatcher, oids: &[Oid]) -> Response {
    let varbinds = oids.iter().cloned().map(VarBind::null).collect();
    send(dispatcher, Mode::Get, varbinds).await
}

pub async fn get_next(dispatcher: &Dispatcher, oids: &[Oid]) -> Response {
    let varbinds = oids.iter().cloned().map(VarBind::null).collect();
    send(dispatcher, Mode::GetNext, varbinds).await
}

/// A SET PDU; the dispatcher runs every phase.
pub async fn set_pdu(dispatcher: &Dispatcher, varbinds: Vec<VarBind>) -> Response {
    send(dispatcher, Mode::SetReserve1, varbinds).await
}

//! Helper handlers in registered chains.

mod common;

use std::sync::Arc;

use common::*;
use proptest::prelude::*;
use snmp_dispatch::agent::Dispatcher;
use snmp_dispatch::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerRegistration, Mode, Request, call_handlers,
};
use snmp_dispatch::helpers::{
    BulkToNext, Multiplexer, Null, Serialize, instance_registration,
    read_only_instance_registration,
};
use snmp_dispatch::{ErrorStatus, Value, VarBind, oid};

/// A leaf that fails on the request at PDU position 1 and counts its calls.
fn fails_on_second(recorder: &Recorder) -> Handler {
    recorder.failing_in_position("flaky", 1, ErrorStatus::WrongValue)
}

#[test]
fn test_serialize_stops_at_first_failure() {
    let recorder = Recorder::new();
    let mut reg = HandlerRegistration::new(
        "serialized",
        oid!(1, 3, 6, 1, 4, 1, 8072, 5),
        fails_on_second(&recorder),
    );
    reg.inject(Serialize::handler());
    let reg = Arc::new(reg);

    let mut reqinfo = AgentRequestInfo::new(Mode::Get);
    let mut requests: Vec<Request> = (0..3)
        .map(|i| Request::new(i, VarBind::null(oid!(1, 3, 6, 1, 4, 1, 8072, 5, i as u32))))
        .collect();
    let result = call_handlers(&reg, &mut reqinfo, &mut requests);

    assert_eq!(result.unwrap_err(), ErrorStatus::WrongValue);
    assert_eq!(recorder.count("flaky"), 2);
    for call in recorder.calls() {
        assert_eq!(call.oids.len(), 1);
    }
    assert!(requests[0].is_processed());
    assert_eq!(requests[1].status(), ErrorStatus::WrongValue);
    assert!(!requests[2].is_processed());
}

#[tokio::test]
async fn test_serialize_status_reaches_response() {
    let recorder = Recorder::new();
    let dispatcher = Dispatcher::new();
    let mut reg = HandlerRegistration::new(
        "serialized",
        oid!(1, 3, 6, 1, 4, 1, 8072, 5),
        fails_on_second(&recorder),
    );
    reg.inject(Serialize::handler());
    dispatcher.register_handler(reg).unwrap();

    let oids: Vec<_> = (0..3).map(|i| oid!(1, 3, 6, 1, 4, 1, 8072, 5, i)).collect();
    let response = get(&dispatcher, &oids).await;
    assert_eq!(response.error_status, ErrorStatus::WrongValue);
    assert_eq!(response.error_index, 2);
    assert_eq!(recorder.count("flaky"), 2);
}

proptest! {
    #[test]
    fn prop_injection_order_is_lifo(count in 0usize..10) {
        let names: Vec<String> = (0..count).map(|i| format!("helper{i}")).collect();
        let mut reg = HandlerRegistration::new(
            "chain",
            oid!(1, 3, 6, 1, 4, 1, 8072, 6),
            Handler::from_fn("leaf", |_ctx, _reqinfo, _requests| Ok(Dispatch::Complete)),
        );
        for name in &names {
            reg.inject(Handler::from_fn(name.as_str(), |ctx, reqinfo, requests| {
                ctx.call_next(reqinfo, requests)
            }));
        }

        let mut expected: Vec<&str> = names.iter().rev().map(String::as_str).collect();
        expected.push("leaf");
        prop_assert_eq!(reg.handler_names(), expected);
    }
}

#[tokio::test]
async fn test_injected_chain_runs_in_lifo_order() {
    let recorder = Recorder::new();
    let dispatcher = Dispatcher::new();
    let mut reg = HandlerRegistration::new(
        "chain",
        oid!(1, 3, 6, 1, 4, 1, 8072, 6),
        recorder.leaf("leaf", Value::Integer(6)),
    );
    reg.inject(recorder.pass("first"));
    reg.inject(recorder.pass("second"));
    dispatcher.register_handler(reg).unwrap();

    let response = get(&dispatcher, &[oid!(1, 3, 6, 1, 4, 1, 8072, 6, 0)]).await;
    assert_eq!(response.varbinds[0].value, Value::Integer(6));
    let order: Vec<&str> = recorder.calls().iter().map(|c| c.handler).collect();
    assert_eq!(order, ["second", "first", "leaf"]);
}

fn system_dispatcher(recorder: &Recorder) -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(read_only_instance_registration(
            "sysDescr",
            sys_descr(),
            recorder.leaf("sysDescr", Value::from("snmp-dispatch test agent")),
        ))
        .unwrap();
    dispatcher
        .register_handler(instance_registration(
            "sysName",
            sys_name(),
            recorder.leaf("sysName", Value::from("router-1")),
        ))
        .unwrap();
    dispatcher
        .register_handler(HandlerRegistration::new(
            "sysContact",
            sys_contact(),
            Null::handler(),
        ))
        .unwrap();
    dispatcher
}

#[tokio::test]
async fn test_instance_get() {
    let dispatcher = system_dispatcher(&Recorder::new());
    let mut below = sys_descr();
    below.push(1).unwrap();

    let response = get(&dispatcher, &[sys_descr(), below, sys_contact(), nonexistent_oid()]).await;
    assert!(response.error_status.is_ok());
    let values: Vec<_> = response.varbinds.iter().map(|vb| vb.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            Value::from("snmp-dispatch test agent"),
            Value::NoSuchObject,
            Value::NoSuchInstance,
            Value::NoSuchObject,
        ]
    );
}

#[tokio::test]
async fn test_instance_getnext_walk() {
    let dispatcher = system_dispatcher(&Recorder::new());

    let response = get_next(&dispatcher, &[system_subtree()]).await;
    assert_eq!(response.varbinds[0].oid, sys_descr());

    // At the instance itself the walk moves on; sysContact's null leaf
    // answers nothing, so sysName is next
    let response = get_next(&dispatcher, &[sys_descr()]).await;
    assert_eq!(response.varbinds[0].oid, sys_name());
    assert_eq!(response.varbinds[0].value, Value::from("router-1"));

    let response = get_next(&dispatcher, &[sys_name()]).await;
    assert_eq!(response.varbinds[0].oid, sys_name());
    assert_eq!(response.varbinds[0].value, Value::EndOfMibView);
}

#[tokio::test]
async fn test_read_only_instance_rejects_set() {
    let recorder = Recorder::new();
    let dispatcher = system_dispatcher(&recorder);

    let response = set_pdu(&dispatcher, vec![VarBind::new(sys_descr(), Value::from("x"))]).await;
    assert_eq!(response.error_status, ErrorStatus::NotWritable);
    assert_eq!(response.error_index, 1);
    assert_eq!(recorder.count("sysDescr"), 0);

    let response = set_pdu(&dispatcher, vec![VarBind::new(sys_name(), Value::from("core-1"))]).await;
    assert!(response.error_status.is_ok());
    assert_eq!(
        recorder.modes_of("sysName"),
        vec![
            Mode::SetReserve1,
            Mode::SetReserve2,
            Mode::SetAction,
            Mode::SetCommit,
            Mode::SetFree,
        ]
    );
}

#[tokio::test]
async fn test_multiplexer_routes_by_mode() {
    let recorder = Recorder::new();
    let mux = Multiplexer::new()
        .get([recorder.leaf("get", Value::Integer(1))])
        .getnext([recorder.pass("getnext"), recorder.leaf("next_leaf", Value::Integer(2))]);
    let dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(HandlerRegistration::new(
            "mux",
            oid!(1, 3, 6, 1, 4, 1, 8072, 7),
            mux.into_handler(),
        ))
        .unwrap();
    let target = oid!(1, 3, 6, 1, 4, 1, 8072, 7, 0);

    let response = get(&dispatcher, &[target.clone()]).await;
    assert_eq!(response.varbinds[0].value, Value::Integer(1));

    let response = send(&dispatcher, Mode::GetBulk, vec![VarBind::null(target.clone())]).await;
    assert_eq!(response.varbinds[0].value, Value::Integer(2));
    assert_eq!(recorder.modes_of("getnext"), vec![Mode::GetBulk]);

    let response = set_pdu(&dispatcher, vec![VarBind::new(target, Value::Integer(3))]).await;
    assert_eq!(response.error_status, ErrorStatus::NotWritable);
    assert_eq!(response.error_index, 1);
}

#[tokio::test]
async fn test_bulk_to_next_restores_mode() {
    let recorder = Recorder::new();
    let dispatcher = Dispatcher::new();
    let mut reg = HandlerRegistration::new(
        "bulk",
        oid!(1, 3, 6, 1, 4, 1, 8072, 8),
        recorder.leaf("leaf", Value::Integer(8)),
    );
    reg.inject(BulkToNext::handler());
    dispatcher.register_handler(reg).unwrap();

    let varbinds = vec![VarBind::null(oid!(1, 3, 6, 1, 4, 1, 8072, 8))];
    let response = send(&dispatcher, Mode::GetBulk, varbinds).await;
    assert_eq!(response.varbinds[0].value, Value::Integer(8));
    assert_eq!(recorder.modes_of("leaf"), vec![Mode::GetNext]);
}

//! Delegated requests completed from the alarm queue.

mod common;

use std::any::Any;
use std::time::Duration;

use common::*;
use snmp_dispatch::agent::Dispatcher;
use snmp_dispatch::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerRegistration, HandlerResult,
    MibHandler, Mode, Request,
};
use snmp_dispatch::table::{IndexType, TableRegistrationInfo, TableRequestInfo, table_registration};
use snmp_dispatch::{ErrorStatus, Oid, Value, VarBind, oid};
use tokio::time::Instant;

/// Answers after `delay` with the value it was given, or never clears the
/// delegated flag when `forgetful`.
struct Slow {
    delay: Duration,
    value: i32,
    forgetful: bool,
}

impl MibHandler for Slow {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        if reqinfo.mode().is_set() && reqinfo.mode() != Mode::SetAction {
            for request in requests.iter_mut() {
                request.mark_processed();
            }
            return Ok(Dispatch::Complete);
        }
        let token = ctx.delegate(reqinfo, requests, self.value);
        Ok(Dispatch::suspended(token.with_delay(self.delay)))
    }

    fn resume(
        &self,
        _registration: &HandlerRegistration,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
        state: Box<dyn Any + Send>,
    ) -> HandlerResult {
        let value = state.downcast::<i32>().map(|v| *v).unwrap_or_default();
        for request in requests.iter_mut() {
            if self.forgetful {
                continue;
            }
            request.set_delegated(false);
            if reqinfo.mode().is_set() {
                request.mark_processed();
            } else {
                request.set_value(Value::Integer(value));
            }
        }
        Ok(Dispatch::Complete)
    }
}

fn slow_root() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 8072, 10)
}

fn slow_registration(
    delay: Duration,
    timeout: Option<Duration>,
    forgetful: bool,
) -> HandlerRegistration {
    let handler = Handler::new(
        "slow",
        Slow {
            delay,
            value: 77,
            forgetful,
        },
    );
    let builder = HandlerRegistration::builder("slow", slow_root()).handler(handler);
    match timeout {
        Some(timeout) => builder.timeout(timeout).build(),
        None => builder.build(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_delegated_get_completes_after_delay() {
    let dispatcher = product_dispatcher(false);
    dispatcher
        .register_handler(slow_registration(Duration::from_millis(200), None, false))
        .unwrap();

    let start = Instant::now();
    let response = get(
        &dispatcher,
        &[
            slow_root().child(0).unwrap(),
            cell(&product_table(), 3, &[2, 2]),
        ],
    )
    .await;

    assert!(start.elapsed() >= Duration::from_millis(200));
    assert!(response.error_status.is_ok());
    assert_eq!(response.varbinds[0].value, Value::Integer(77));
    assert_eq!(response.varbinds[0].oid, slow_root().child(0).unwrap());
    assert_eq!(response.varbinds[1].value, Value::Integer(4));
}

#[tokio::test(start_paused = true)]
async fn test_delay_past_timeout_fails() {
    let dispatcher = product_dispatcher(false);
    dispatcher
        .register_handler(slow_registration(
            Duration::from_secs(5),
            Some(Duration::from_secs(1)),
            false,
        ))
        .unwrap();

    let start = Instant::now();
    let response = get(
        &dispatcher,
        &[
            cell(&product_table(), 3, &[1, 1]),
            slow_root().child(0).unwrap(),
        ],
    )
    .await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(response.error_status, ErrorStatus::GenErr);
    assert_eq!(response.error_index, 2);
    assert_eq!(response.varbinds[0].value, Value::Integer(1));
}

#[tokio::test(start_paused = true)]
async fn test_unfinished_resume_fails() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(slow_registration(Duration::from_millis(10), None, true))
        .unwrap();

    let response = get(&dispatcher, &[slow_root().child(0).unwrap()]).await;
    assert_eq!(response.error_status, ErrorStatus::GenErr);
    assert_eq!(response.error_index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_delegated_action_completes_transaction() {
    let recorder = Recorder::new();
    let dispatcher = Dispatcher::new();
    let mut registration = slow_registration(Duration::from_millis(30), None, false);
    registration.inject(recorder.pass("spy"));
    dispatcher.register_handler(registration).unwrap();

    let response = set_pdu(
        &dispatcher,
        vec![VarBind::new(slow_root().child(0).unwrap(), Value::Integer(1))],
    )
    .await;

    assert!(response.error_status.is_ok());
    assert_eq!(
        recorder.modes_of("spy"),
        vec![
            Mode::SetReserve1,
            Mode::SetReserve2,
            Mode::SetAction,
            Mode::SetCommit,
            Mode::SetFree,
        ]
    );
}

/// A table leaf that answers `column * 100 + index` once resumed, reading
/// the coordinates the table resolver attached.
struct SlowCells;

impl MibHandler for SlowCells {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let token = ctx.delegate(reqinfo, requests, ());
        Ok(Dispatch::suspended(token.with_delay(Duration::from_millis(50))))
    }

    fn resume(
        &self,
        _registration: &HandlerRegistration,
        _reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
        _state: Box<dyn Any + Send>,
    ) -> HandlerResult {
        for request in requests.iter_mut() {
            let Some(table_info) = TableRequestInfo::of(request) else {
                continue;
            };
            let column = table_info.colnum.column().unwrap_or_default() as i32;
            let index = table_info.indexes[0].as_i32().unwrap_or_default();
            request.set_delegated(false);
            request.set_value(Value::Integer(column * 100 + index));
        }
        Ok(Dispatch::Complete)
    }
}

#[tokio::test(start_paused = true)]
async fn test_delegated_table_leaf_keeps_coordinates() {
    let root = oid!(1, 3, 6, 1, 4, 1, 8072, 11);
    let info = TableRegistrationInfo::builder()
        .index(IndexType::Integer)
        .columns(2, 4)
        .build();
    let dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(table_registration(
            "slowTable",
            root.clone(),
            info,
            Handler::new("slow_cells", SlowCells),
        ))
        .unwrap();

    let response = get(&dispatcher, &[cell(&root, 3, &[7]), cell(&root, 4, &[2])]).await;
    assert!(response.error_status.is_ok());
    assert_eq!(response.varbinds[0].value, Value::Integer(307));
    assert_eq!(response.varbinds[1].value, Value::Integer(402));
}

//! Six-phase SET transaction (RFC 3416 as-if-simultaneous semantics).

use std::sync::Arc;

use crate::error::ErrorStatus;
use crate::handler::{AgentRequestInfo, HandlerRegistration, Mode, Request};
use crate::varbind::VarBind;

use super::{Dispatcher, Response, into_response, into_slots};

impl Dispatcher {
    /// Handle a SET PDU.
    ///
    /// Each phase runs for every varbind before the next phase starts:
    ///
    /// 1. **RESERVE1**: check types, lengths and writability. Any failure runs FREE.
    /// 2. **RESERVE2**: allocate and snapshot. Any failure runs FREE.
    /// 3. **ACTION**: apply the new values. Any failure runs UNDO, then FREE.
    /// 4. **COMMIT**: make the values final. A failure is reported as
    ///    `commitFailed`; FREE still runs.
    /// 5. **FREE**: release per-request state.
    ///
    /// The error index names the first varbind that failed. Attachments of
    /// every request are released once the transaction ends, whatever its
    /// outcome.
    pub async fn process_set(
        &self,
        reqinfo: &mut AgentRequestInfo,
        varbinds: Vec<VarBind>,
    ) -> Response {
        let mut slots = into_slots(varbinds);
        let context = reqinfo.context().map(str::to_string);

        let mut routes: Vec<(usize, Arc<HandlerRegistration>)> = Vec::with_capacity(slots.len());
        let mut unrouted = None;
        for request in slots.iter().flatten() {
            match self.find_registration(context.as_deref(), request.oid()) {
                Some(registration) => routes.push((request.index(), registration)),
                None => {
                    tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::DEBUG,
                        snmp.oid = %request.oid(),
                        "no registration for SET varbind"
                    );
                    unrouted = Some(request.index());
                    break;
                }
            }
        }
        // Nothing could ever accept the write, so no phase runs at all
        if let Some(index) = unrouted {
            return into_response(slots, Some((ErrorStatus::NotWritable, index)));
        }

        // ========== RESERVE1 / RESERVE2 ==========
        for mode in [Mode::SetReserve1, Mode::SetReserve2] {
            if let Some(failure) = self.run_phase(mode, reqinfo, &mut slots, &routes).await {
                self.cleanup_phase(Mode::SetFree, reqinfo, &mut slots, &routes)
                    .await;
                return into_response(slots, Some(failure));
            }
        }

        // ========== ACTION ==========
        if let Some(failure) = self
            .run_phase(Mode::SetAction, reqinfo, &mut slots, &routes)
            .await
        {
            self.cleanup_phase(Mode::SetUndo, reqinfo, &mut slots, &routes)
                .await;
            self.cleanup_phase(Mode::SetFree, reqinfo, &mut slots, &routes)
                .await;
            return into_response(slots, Some(failure));
        }

        // ========== COMMIT ==========
        let commit_failure = self
            .run_phase(Mode::SetCommit, reqinfo, &mut slots, &routes)
            .await
            .map(|(_, index)| (ErrorStatus::CommitFailed, index));

        self.cleanup_phase(Mode::SetFree, reqinfo, &mut slots, &routes)
            .await;
        into_response(slots, commit_failure)
    }

    async fn run_phase(
        &self,
        mode: Mode,
        reqinfo: &mut AgentRequestInfo,
        slots: &mut [Option<Request>],
        routes: &[(usize, Arc<HandlerRegistration>)],
    ) -> Option<(ErrorStatus, usize)> {
        reqinfo.set_mode(mode);
        for request in slots.iter_mut().flatten() {
            request.begin_pass();
        }
        tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::DEBUG,
            snmp.mode = %mode,
            snmp.varbind_count = routes.len(),
            "running SET phase"
        );
        self.dispatch_pass(reqinfo, slots, routes).await
    }

    /// Run UNDO or FREE, which must reach every handler and cannot fail the PDU.
    async fn cleanup_phase(
        &self,
        mode: Mode,
        reqinfo: &mut AgentRequestInfo,
        slots: &mut [Option<Request>],
        routes: &[(usize, Arc<HandlerRegistration>)],
    ) {
        let before: Vec<ErrorStatus> = slots.iter().flatten().map(Request::status).collect();
        let failure = self.run_phase(mode, reqinfo, slots, routes).await;

        // Statuses left over from the failed phase are not news
        let changed = slots
            .iter()
            .flatten()
            .zip(&before)
            .find(|(request, status)| request.status() != **status)
            .map(|(request, _)| (request.status(), request.index()));
        let aborted = failure.filter(|(status, index)| before.get(*index) != Some(status));

        if let Some((status, index)) = changed.or(aborted) {
            tracing::event!(
                target: "snmp_dispatch::agent",
                tracing::Level::WARN,
                snmp.mode = %mode,
                snmp.error_status = %status,
                snmp.error_index = index + 1,
                "SET cleanup phase reported an error"
            );
        }
    }
}

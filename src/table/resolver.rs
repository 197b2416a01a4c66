//! Table OID resolution.

use crate::error::ErrorStatus;
use crate::handler::{AgentRequestInfo, Handler, HandlerCtx, HandlerResult, MibHandler, Request};
use crate::oid::{MAX_OID_LEN, Oid};

use super::{
    ColumnPosition, TABLE_INFO_KEY, TableRegistrationInfo, TableRequestInfo, parse_index,
    parse_index_prefix,
};

/// Decomposes `<table>.1.<column>.<index>` requests into [`TableRequestInfo`].
///
/// For GET and SET, a request that does not name a valid cell (wrong entry
/// arc, invalid column, malformed or incomplete index) fails with
/// `noSuchName` and the rest of the batch is abandoned.
///
/// For GETNEXT and GETBULK nothing fails: OIDs before the table start at the
/// first column, columns between valid ones move to the next valid column with
/// no index, partial indexes are kept, and anything past the last column is
/// marked [`ColumnPosition::EndOfTable`] and left unprocessed.
///
/// Handlers below see the coordinates through [`TableRequestInfo::of`]; the
/// resolver detaches them again once the rest of the chain returns.
#[derive(Debug, Clone)]
pub struct TableResolver {
    info: TableRegistrationInfo,
}

impl TableResolver {
    pub fn new(info: TableRegistrationInfo) -> Self {
        Self { info }
    }

    pub fn handler(info: TableRegistrationInfo) -> Handler {
        Handler::new("table", Self::new(info))
    }

    pub fn info(&self) -> &TableRegistrationInfo {
        &self.info
    }

    /// Coordinates for a GETNEXT/GETBULK request.
    fn resolve_next(&self, root: &Oid, oid: &Oid) -> TableRequestInfo {
        let start = |column: Option<u32>| TableRequestInfo {
            colnum: column.map_or(ColumnPosition::EndOfTable, ColumnPosition::Column),
            indexes: Vec::new(),
            index_oid: Oid::empty(),
        };
        let end = || start(None);

        // Requests below the root were rewritten to it by `handle`
        if !oid.starts_with(root) {
            return end();
        }

        let base = root.len();
        match oid.get(base) {
            None | Some(0) => return start(self.info.first_column()),
            Some(1) => {}
            Some(_) => return end(),
        }
        let Some(requested) = oid.get(base + 1) else {
            return start(self.info.first_column());
        };
        if requested < self.info.min_column() {
            return start(self.info.first_column());
        }
        if requested > self.info.max_column() {
            return end();
        }
        let Some(column) = self.info.next_column(requested) else {
            return end();
        };
        if column != requested {
            return start(Some(column));
        }

        // No index is longer than MAX_OID_LEN, so cutting the suffix skips no row
        let mut arcs = oid.suffix(base + 2);
        if arcs.len() > MAX_OID_LEN {
            arcs = &arcs[..MAX_OID_LEN];
        }
        TableRequestInfo {
            colnum: ColumnPosition::Column(column),
            indexes: parse_index_prefix(self.info.indexes(), arcs),
            index_oid: Oid::from_slice(arcs),
        }
    }

    /// Coordinates for a GET or SET request, or `None` if it names no cell.
    fn resolve_exact(&self, root: &Oid, oid: &Oid) -> Option<TableRequestInfo> {
        let base = root.len();
        if !oid.starts_with(root) || oid.len() > base + 2 + MAX_OID_LEN {
            return None;
        }
        if oid.get(base)? != 1 {
            return None;
        }
        let column = oid.get(base + 1)?;
        if !self.info.is_valid_column(column) {
            return None;
        }
        let arcs = oid.suffix(base + 2);
        let indexes = parse_index(self.info.indexes(), arcs).ok()?;
        Some(TableRequestInfo {
            colnum: ColumnPosition::Column(column),
            indexes,
            index_oid: Oid::from_slice(arcs),
        })
    }
}

impl MibHandler for TableResolver {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let root = ctx.root();
        let mode = reqinfo.mode();

        for position in 0..requests.len() {
            let request = &mut requests[position];
            if request.is_processed() {
                continue;
            }

            let table_info = if mode.is_getnext_like() {
                if request.oid() < root {
                    request.varbind.oid = root.clone();
                }
                self.resolve_next(root, request.oid())
            } else {
                match self.resolve_exact(root, request.oid()) {
                    Some(table_info) => table_info,
                    None => {
                        tracing::event!(
                target: "snmp_dispatch::table",
                tracing::Level::DEBUG,
                            snmp.registration = %ctx.registration().name(),
                            snmp.oid = %request.oid(),
                            snmp.mode = %mode,
                            "request does not name a table cell"
                        );
                        request.set_error(ErrorStatus::NoSuchName);
                        release(&mut requests[..position]);
                        return Err(ErrorStatus::NoSuchName);
                    }
                }
            };

            tracing::event!(
                target: "snmp_dispatch::table",
                tracing::Level::TRACE,
                snmp.oid = %request.oid(),
                colnum = ?table_info.colnum,
                index_count = table_info.number_indexes(),
                "resolved table request"
            );
            request.attachments.insert(TABLE_INFO_KEY, table_info);
        }

        let result = ctx.call_next(reqinfo, requests);
        release(requests);
        result
    }
}

/// Detach table coordinates, except from requests still delegated: the
/// handler resuming them needs the coordinates, and `Request::finish`
/// releases them at the end of the cycle.
fn release(requests: &mut [Request]) {
    for request in requests.iter_mut().filter(|r| !r.is_delegated()) {
        request.attachments.free(TABLE_INFO_KEY);
    }
}

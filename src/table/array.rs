//! Tables backed by an in-memory row array.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ErrorStatus, Result};
use crate::handler::{
    AgentRequestInfo, Handler, HandlerCtx, HandlerRegistration, HandlerResult, MibHandler, Mode,
    Request,
};
use crate::oid::Oid;
use crate::value::Value;

use super::{
    ColumnPosition, OrderedIndexArray, TableRegistrationInfo, TableRequestInfo, TableResolver,
    build_index, instance_oid, next_cell, parse_index_prefix,
};

/// Attachment key of the row found for a request.
pub const TABLE_ARRAY_ROW_KEY: &str = "table_array_row";

/// Resolves table requests to rows of an [`OrderedIndexArray`].
///
/// Sits below a [`TableResolver`]. For GET and SET it looks up the row named
/// by the index; a GET for a missing row fails with `noSuchName`, while a SET
/// is passed on so the leaf may create the row. For GETNEXT and GETBULK it
/// finds the next row (moving on to later columns as needed), rewrites the
/// request OID to that cell and calls the leaf in GET mode.
///
/// Leaf handlers fetch the row with [`TableArray::row`] and skip requests
/// that have none.
pub struct TableArray<R> {
    info: TableRegistrationInfo,
    rows: Arc<Mutex<OrderedIndexArray<Arc<R>>>>,
}

impl<R: Send + Sync + 'static> TableArray<R> {
    pub fn new(info: TableRegistrationInfo) -> Self {
        Self {
            info,
            rows: Arc::new(Mutex::new(OrderedIndexArray::new())),
        }
    }

    pub fn info(&self) -> &TableRegistrationInfo {
        &self.info
    }

    /// Add a row under the index built from `indexes`, returning that index.
    pub fn insert_row(&self, indexes: &[Value], row: R) -> Result<Oid> {
        let index = build_index(self.info.indexes(), indexes)?;
        self.rows.lock().insert(index.clone(), Arc::new(row));
        Ok(index)
    }

    /// Add a row under an already encoded index.
    pub fn insert_row_at(&self, index: Oid, row: R) {
        self.rows.lock().insert(index, Arc::new(row));
    }

    pub fn remove_row(&self, index: &Oid) -> Option<Arc<R>> {
        self.rows.lock().remove(index)
    }

    pub fn get_row(&self, index: &Oid) -> Option<Arc<R>> {
        self.rows.lock().get(index).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    /// A chain node sharing this table's rows.
    pub fn handler(&self) -> Handler {
        Handler::new("table_array", self.clone())
    }

    /// The row attached to `request` by the table array, if any.
    pub fn row(request: &Request) -> Option<&Arc<R>> {
        request.attachments.get::<Arc<R>>(TABLE_ARRAY_ROW_KEY)
    }

    fn resolve_next(
        &self,
        root: &Oid,
        rows: &mut OrderedIndexArray<Arc<R>>,
        request: &mut Request,
        column: u32,
    ) {
        let Some(table_info) = TableRequestInfo::of_mut(request) else {
            return;
        };
        let start = (!table_info.index_oid.is_empty()).then_some(&table_info.index_oid);
        let found = next_cell(&self.info, rows, column, start, |_, _| true).and_then(
            |(column, index)| {
                let oid = instance_oid(root, column, &index).ok()?;
                let row = rows.get(&index)?.clone();
                Some((column, index, oid, row))
            },
        );

        match found {
            Some((column, index, oid, row)) => {
                table_info.colnum = ColumnPosition::Column(column);
                table_info.indexes = parse_index_prefix(self.info.indexes(), index.arcs());
                table_info.index_oid = index;
                request.varbind.oid = oid;
                request.attachments.insert(TABLE_ARRAY_ROW_KEY, row);
            }
            None => table_info.colnum = ColumnPosition::EndOfTable,
        }
    }
}

impl<R> Clone for TableArray<R> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<R> fmt::Debug for TableArray<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableArray")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl<R: Send + Sync + 'static> MibHandler for TableArray<R> {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let mode = reqinfo.mode();
        {
            let mut rows = self.rows.lock();
            for request in requests.iter_mut().filter(|r| !r.is_processed()) {
                let Some(table_info) = TableRequestInfo::of(request) else {
                    continue;
                };
                let Some(column) = table_info.colnum.column() else {
                    continue;
                };

                if mode.is_getnext_like() {
                    self.resolve_next(ctx.root(), &mut rows, request, column);
                    continue;
                }

                match rows.get(&table_info.index_oid).cloned() {
                    Some(row) => request.attachments.insert(TABLE_ARRAY_ROW_KEY, row),
                    None if mode.is_set() => {}
                    None => {
                        tracing::event!(
                target: "snmp_dispatch::table",
                tracing::Level::TRACE,
                            snmp.oid = %request.oid(),
                            "no row for index"
                        );
                        request.set_error(ErrorStatus::NoSuchName);
                    }
                }
            }
        }

        let result = if mode.is_getnext_like() {
            let saved = reqinfo.set_mode(Mode::Get);
            let result = ctx.call_next(reqinfo, requests);
            reqinfo.set_mode(saved);
            result
        } else {
            ctx.call_next(reqinfo, requests)
        };

        for request in requests.iter_mut().filter(|r| !r.is_delegated()) {
            request.attachments.free(TABLE_ARRAY_ROW_KEY);
        }
        result
    }
}

/// A registration with the chain table resolver, `array`, `leaf`.
pub fn table_array_registration<R: Send + Sync + 'static>(
    name: impl Into<String>,
    root: Oid,
    array: &TableArray<R>,
    leaf: Handler,
) -> HandlerRegistration {
    let mut registration = HandlerRegistration::new(name, root, leaf);
    registration.inject(array.handler());
    registration.inject(TableResolver::handler(array.info().clone()));
    registration
}

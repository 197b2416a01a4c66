//! Generic column storage with the SET transaction.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{ErrorStatus, Result};
use crate::handler::{
    AgentRequestInfo, Dispatch, Handler, HandlerCtx, HandlerRegistration, HandlerResult,
    MibHandler, Mode, Request,
};
use crate::oid::Oid;
use crate::value::{Exception, Value, ValueType};

use super::{
    ColumnPosition, ColumnSet, IndexType, OrderedIndexArray, TableRegistrationInfo,
    TableRequestInfo, TableResolver, build_index, instance_oid, next_cell, parse_index_prefix,
};

/// Attachment key of the value saved in RESERVE2 for UNDO.
const UNDO_KEY: &str = "table_data_set_undo";

/// Request state marking a row created by this request's ACTION.
struct CreatedRow;

/// One cell of a [`DataSetRow`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetColumn {
    pub column: u32,
    pub ty: ValueType,
    pub writable: bool,
    /// `None` until the cell is given a value.
    pub data: Option<Value>,
}

/// A row: its index and one cell per template column, ordered by column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetRow {
    pub index: Oid,
    pub indexes: Vec<Value>,
    pub columns: Vec<DataSetColumn>,
}

impl DataSetRow {
    fn from_template(index: Oid, indexes: Vec<Value>, template: &[DataSetColumn]) -> Self {
        Self {
            index,
            indexes,
            columns: template.to_vec(),
        }
    }

    pub fn column(&self, column: u32) -> Option<&DataSetColumn> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn column_mut(&mut self, column: u32) -> Option<&mut DataSetColumn> {
        self.columns.iter_mut().find(|c| c.column == column)
    }

    /// The value of a cell, `None` if the column is unknown or empty.
    pub fn value(&self, column: u32) -> Option<&Value> {
        self.column(column)?.data.as_ref()
    }
}

/// A table whose rows are held entirely by the agent.
///
/// Every row carries the columns of a template set up with
/// [`TableDataSetBuilder::column`]. The data set answers GET and GETNEXT
/// itself and runs the SET phases:
///
/// | Phase    | Action                                                   |
/// |----------|----------------------------------------------------------|
/// | RESERVE1 | Check writability, type and row existence; touch nothing |
/// | RESERVE2 | Save the current cell value for UNDO                     |
/// | ACTION   | Create the row if allowed, then write the new value      |
/// | UNDO     | Remove a created row, or restore the saved value         |
/// | COMMIT   | Drop the saved value                                     |
/// | FREE     | Drop whatever the request still holds                    |
///
/// Clones share the same rows.
#[derive(Clone)]
pub struct TableDataSet {
    info: TableRegistrationInfo,
    template: Arc<[DataSetColumn]>,
    allow_row_creation: bool,
    rows: Arc<Mutex<OrderedIndexArray<DataSetRow>>>,
}

impl TableDataSet {
    pub fn builder() -> TableDataSetBuilder {
        TableDataSetBuilder::default()
    }

    /// Table shape derived from the index template and column template.
    pub fn info(&self) -> &TableRegistrationInfo {
        &self.info
    }

    pub fn template(&self) -> &[DataSetColumn] {
        &self.template
    }

    pub fn allows_row_creation(&self) -> bool {
        self.allow_row_creation
    }

    /// A chain node serving this data set.
    pub fn handler(&self) -> Handler {
        Handler::new("table_data_set", self.clone())
    }

    /// A registration with the chain table resolver, data set.
    pub fn registration(&self, name: impl Into<String>, root: Oid) -> HandlerRegistration {
        let mut registration = HandlerRegistration::new(name, root, self.handler());
        registration.inject(TableResolver::handler(self.info.clone()));
        registration
    }

    /// Add an empty row for the given index values, returning its index OID.
    ///
    /// A row already present under the same index is replaced.
    pub fn add_row(&self, indexes: &[Value]) -> Result<Oid> {
        let index = build_index(self.info.indexes(), indexes)?;
        let row = DataSetRow::from_template(index.clone(), indexes.to_vec(), &self.template);
        self.rows.lock().insert(index.clone(), row);
        Ok(index)
    }

    /// Set a cell directly, bypassing the writable flag.
    pub fn set_value(
        &self,
        index: &Oid,
        column: u32,
        value: Value,
    ) -> std::result::Result<(), ErrorStatus> {
        let mut rows = self.rows.lock();
        let cell = rows
            .get_mut(index)
            .and_then(|row| row.column_mut(column))
            .ok_or(ErrorStatus::NoSuchName)?;
        if cell.ty != value.value_type() {
            return Err(ErrorStatus::WrongType);
        }
        cell.data = Some(value);
        Ok(())
    }

    pub fn get_value(&self, index: &Oid, column: u32) -> Option<Value> {
        self.rows.lock().get(index)?.value(column).cloned()
    }

    pub fn row(&self, index: &Oid) -> Option<DataSetRow> {
        self.rows.lock().get(index).cloned()
    }

    pub fn remove_row(&self, index: &Oid) -> Option<DataSetRow> {
        self.rows.lock().remove(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    fn get(&self, rows: &mut OrderedIndexArray<DataSetRow>, request: &mut Request, column: u32) {
        let Some(table_info) = TableRequestInfo::of(request) else {
            return;
        };
        match rows.get(&table_info.index_oid).and_then(|row| row.value(column)) {
            Some(value) => request.set_value(value.clone()),
            None => request.set_exception(Mode::Get, Exception::NoSuchInstance),
        }
    }

    fn get_next(
        &self,
        root: &Oid,
        rows: &mut OrderedIndexArray<DataSetRow>,
        request: &mut Request,
        column: u32,
    ) {
        let Some(table_info) = TableRequestInfo::of_mut(request) else {
            return;
        };
        let start = (!table_info.index_oid.is_empty()).then_some(&table_info.index_oid);
        let found = next_cell(&self.info, rows, column, start, |column, row| {
            row.value(column).is_some()
        })
        .and_then(|(column, index)| {
            let oid = instance_oid(root, column, &index).ok()?;
            let value = rows.get(&index)?.value(column)?.clone();
            Some((column, index, oid, value))
        });

        match found {
            Some((column, index, oid, value)) => {
                table_info.colnum = ColumnPosition::Column(column);
                table_info.indexes = parse_index_prefix(self.info.indexes(), index.arcs());
                table_info.index_oid = index;
                request.varbind.oid = oid;
                request.set_value(value);
            }
            None => table_info.colnum = ColumnPosition::EndOfTable,
        }
    }

    /// RESERVE1: validate without touching data.
    fn check(
        &self,
        rows: &mut OrderedIndexArray<DataSetRow>,
        request: &Request,
        column: u32,
    ) -> std::result::Result<(), ErrorStatus> {
        let Some(table_info) = TableRequestInfo::of(request) else {
            return Err(ErrorStatus::GenErr);
        };
        let template = self
            .template
            .iter()
            .find(|c| c.column == column)
            .ok_or(ErrorStatus::NotWritable)?;
        if !template.writable {
            return Err(ErrorStatus::NotWritable);
        }
        if template.ty != request.value().value_type() {
            return Err(ErrorStatus::WrongType);
        }
        if !self.allow_row_creation && rows.get(&table_info.index_oid).is_none() {
            return Err(ErrorStatus::NoCreation);
        }
        Ok(())
    }

    /// ACTION: write the value, creating the row first if needed.
    fn write(
        &self,
        rows: &mut OrderedIndexArray<DataSetRow>,
        request: &mut Request,
        column: u32,
    ) -> std::result::Result<(), ErrorStatus> {
        let Some(table_info) = TableRequestInfo::of(request) else {
            return Err(ErrorStatus::GenErr);
        };
        let index = table_info.index_oid.clone();
        if rows.get(&index).is_none() {
            if !self.allow_row_creation {
                return Err(ErrorStatus::NoCreation);
            }
            let row =
                DataSetRow::from_template(index.clone(), table_info.indexes.clone(), &self.template);
            rows.insert(index.clone(), row);
            request.set_state(CreatedRow);
            tracing::event!(
                target: "snmp_dispatch::table",
                tracing::Level::DEBUG,
                snmp.oid = %request.oid(),
                "created row"
            );
        }

        let value = request.value().clone();
        let cell = rows
            .get_mut(&index)
            .and_then(|row| row.column_mut(column))
            .ok_or(ErrorStatus::GenErr)?;
        cell.data = Some(value);
        Ok(())
    }

    /// UNDO: drop a row this request created, else restore the saved value.
    fn undo(&self, rows: &mut OrderedIndexArray<DataSetRow>, request: &mut Request, column: u32) {
        let Some(index) = TableRequestInfo::of(request).map(|t| t.index_oid.clone()) else {
            return;
        };
        let saved = request.attachments.remove::<Option<Value>>(UNDO_KEY);
        if request.take_state::<CreatedRow>().is_some() {
            rows.remove(&index);
            return;
        }
        if let Some(saved) = saved
            && let Some(cell) = rows.get_mut(&index).and_then(|row| row.column_mut(column))
        {
            cell.data = saved;
        }
    }
}

impl fmt::Debug for TableDataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDataSet")
            .field("info", &self.info)
            .field("template", &self.template)
            .field("allow_row_creation", &self.allow_row_creation)
            .finish_non_exhaustive()
    }
}

impl MibHandler for TableDataSet {
    fn handle(
        &self,
        ctx: &HandlerCtx<'_>,
        reqinfo: &mut AgentRequestInfo,
        requests: &mut [Request],
    ) -> HandlerResult {
        let mode = reqinfo.mode();
        let mut rows = self.rows.lock();

        for request in requests.iter_mut().filter(|r| !r.is_processed()) {
            let Some(column) = TableRequestInfo::of(request).and_then(|t| t.colnum.column())
            else {
                continue;
            };

            match mode {
                Mode::Get => self.get(&mut rows, request, column),
                Mode::GetNext | Mode::GetBulk => {
                    self.get_next(ctx.root(), &mut rows, request, column)
                }
                Mode::SetReserve1 => {
                    if let Err(status) = self.check(&mut rows, request, column) {
                        tracing::event!(
                target: "snmp_dispatch::table",
                tracing::Level::DEBUG,
                            snmp.oid = %request.oid(),
                            snmp.error_status = %status,
                            "set rejected"
                        );
                        request.set_error(status);
                        return Err(status);
                    }
                    request.mark_processed();
                }
                Mode::SetReserve2 => {
                    let index = TableRequestInfo::of(request).map(|t| t.index_oid.clone());
                    let current = index.and_then(|index| {
                        rows.get(&index).and_then(|row| row.value(column).cloned())
                    });
                    request.attachments.insert(UNDO_KEY, current);
                    request.mark_processed();
                }
                Mode::SetAction => {
                    if let Err(status) = self.write(&mut rows, request, column) {
                        request.set_error(status);
                        return Err(status);
                    }
                    request.mark_processed();
                }
                Mode::SetUndo => {
                    self.undo(&mut rows, request, column);
                    request.mark_processed();
                }
                Mode::SetCommit | Mode::SetFree => {
                    request.attachments.free(UNDO_KEY);
                    request.take_state::<CreatedRow>();
                    request.mark_processed();
                }
            }
        }
        Ok(Dispatch::Complete)
    }
}

/// Builder for [`TableDataSet`].
#[derive(Debug, Default)]
pub struct TableDataSetBuilder {
    indexes: Vec<IndexType>,
    template: Vec<DataSetColumn>,
    allow_row_creation: bool,
}

impl TableDataSetBuilder {
    pub fn index(mut self, index: IndexType) -> Self {
        self.indexes.push(index);
        self
    }

    /// Add a column to the template every row is created from.
    pub fn column(mut self, column: u32, ty: ValueType, writable: bool) -> Self {
        self.template.retain(|c| c.column != column);
        self.template.push(DataSetColumn {
            column,
            ty,
            writable,
            data: None,
        });
        self
    }

    /// Let SET create rows that do not exist yet.
    pub fn allow_row_creation(mut self, allow: bool) -> Self {
        self.allow_row_creation = allow;
        self
    }

    pub fn build(mut self) -> TableDataSet {
        self.template.sort_by_key(|c| c.column);
        let columns: Vec<u32> = self.template.iter().map(|c| c.column).collect();
        let min = columns.first().copied().unwrap_or(1);
        let max = columns.last().copied().unwrap_or(1);
        let info = TableRegistrationInfo::builder()
            .indexes(self.indexes)
            .columns(min, max)
            .valid_columns(ColumnSet::new().list(columns))
            .build();

        TableDataSet {
            info,
            template: self.template.into(),
            allow_row_creation: self.allow_row_creation,
            rows: Arc::new(Mutex::new(OrderedIndexArray::new())),
        }
    }
}

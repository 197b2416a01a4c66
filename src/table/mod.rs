//! Conceptual table support.
//!
//! Tables are registered at the table OID (`fooTable`), so requests arrive as
//! `<table>.1.<column>.<index>`. The helpers here decompose that OID so leaf
//! handlers deal in columns and rows:
//!
//! - [`TableResolver`] - Validates the column and parses the index into a
//!   [`TableRequestInfo`] attached to each request
//! - [`TableArray`] - Rows held in an [`OrderedIndexArray`]; resolves GET to a
//!   row and GETNEXT to the next row or column
//! - [`TableDataSet`] - Complete column storage with the SET transaction
//!
//! # Example
//!
//! ```rust
//! use snmp_dispatch::handler::{Dispatch, Handler};
//! use snmp_dispatch::table::{IndexType, TableRegistrationInfo, TableRequestInfo, table_registration};
//! use snmp_dispatch::{Value, oid};
//!
//! let info = TableRegistrationInfo::builder()
//!     .index(IndexType::Integer)
//!     .columns(2, 3)
//!     .build();
//! let leaf = Handler::from_fn("ifTable", |_ctx, _reqinfo, requests| {
//!     for request in requests.iter_mut() {
//!         let Some(column) = TableRequestInfo::of(request).and_then(|t| t.colnum.column()) else {
//!             continue;
//!         };
//!         request.set_value(Value::Integer(column as i32));
//!     }
//!     Ok(Dispatch::Complete)
//! });
//! let reg = table_registration("ifTable", oid!(1, 3, 6, 1, 2, 1, 2, 2), info, leaf);
//! assert_eq!(reg.handler_names(), ["table", "ifTable"]);
//! ```

mod array;
mod columns;
mod dataset;
mod index;
mod index_array;
mod resolver;

pub use array::{TableArray, table_array_registration};
pub use columns::{ColumnInfo, ColumnSet};
pub use dataset::{DataSetColumn, DataSetRow, TableDataSet, TableDataSetBuilder};
pub use index::{IndexType, build_index, parse_index, parse_index_prefix};
pub use index_array::OrderedIndexArray;
pub use resolver::TableResolver;

use crate::handler::{Handler, HandlerRegistration, Request};
use crate::oid::Oid;
use crate::value::Value;

/// Attachment key of [`TableRequestInfo`].
pub const TABLE_INFO_KEY: &str = "table_info";

/// Shape of a registered table: index template and column bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegistrationInfo {
    indexes: Vec<IndexType>,
    min_column: u32,
    max_column: u32,
    valid_columns: Option<ColumnSet>,
}

impl TableRegistrationInfo {
    pub fn builder() -> TableRegistrationInfoBuilder {
        TableRegistrationInfoBuilder {
            info: TableRegistrationInfo {
                indexes: Vec::new(),
                min_column: 1,
                max_column: u32::MAX,
                valid_columns: None,
            },
        }
    }

    /// Index template in OID order.
    pub fn indexes(&self) -> &[IndexType] {
        &self.indexes
    }

    pub fn number_indexes(&self) -> usize {
        self.indexes.len()
    }

    pub fn min_column(&self) -> u32 {
        self.min_column
    }

    pub fn max_column(&self) -> u32 {
        self.max_column
    }

    pub fn valid_columns(&self) -> Option<&ColumnSet> {
        self.valid_columns.as_ref()
    }

    /// Returns `true` if `column` is within bounds and listed as valid.
    pub fn is_valid_column(&self, column: u32) -> bool {
        (self.min_column..=self.max_column).contains(&column)
            && self
                .valid_columns
                .as_ref()
                .is_none_or(|set| set.contains(column))
    }

    /// The first valid column `>= column`.
    pub fn next_column(&self, column: u32) -> Option<u32> {
        let column = column.max(self.min_column);
        let next = match &self.valid_columns {
            Some(set) => set.closest_column(column)?,
            None => column,
        };
        (next <= self.max_column).then_some(next)
    }

    /// The first valid column of the table.
    pub fn first_column(&self) -> Option<u32> {
        self.next_column(self.min_column)
    }
}

/// Builder for [`TableRegistrationInfo`].
#[derive(Debug, Clone)]
pub struct TableRegistrationInfoBuilder {
    info: TableRegistrationInfo,
}

impl TableRegistrationInfoBuilder {
    /// Append an index column to the template.
    pub fn index(mut self, index: IndexType) -> Self {
        self.info.indexes.push(index);
        self
    }

    pub fn indexes(mut self, indexes: impl IntoIterator<Item = IndexType>) -> Self {
        self.info.indexes.extend(indexes);
        self
    }

    /// Inclusive column bounds.
    pub fn columns(mut self, min: u32, max: u32) -> Self {
        self.info.min_column = min.min(max);
        self.info.max_column = max.max(min);
        self
    }

    /// Restrict the table to a sparse set of columns within the bounds.
    pub fn valid_columns(mut self, columns: ColumnSet) -> Self {
        self.info.valid_columns = Some(columns);
        self
    }

    pub fn build(self) -> TableRegistrationInfo {
        self.info
    }
}

/// Where in the table a request points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnPosition {
    /// Not resolved yet.
    #[default]
    Unset,
    Column(u32),
    /// Past the last column; a GETNEXT must continue in a later subtree.
    EndOfTable,
}

impl ColumnPosition {
    pub fn column(self) -> Option<u32> {
        match self {
            ColumnPosition::Column(column) => Some(column),
            _ => None,
        }
    }
}

/// Per-request table coordinates produced by [`TableResolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRequestInfo {
    pub colnum: ColumnPosition,
    /// Index values parsed so far (all of them for GET and SET).
    pub indexes: Vec<Value>,
    /// Sub-identifiers of the index as found in (or rewritten for) the request.
    pub index_oid: Oid,
}

impl TableRequestInfo {
    /// Number of index values parsed.
    pub fn number_indexes(&self) -> usize {
        self.indexes.len()
    }

    /// The table coordinates attached to `request`, if it went through a resolver.
    pub fn of(request: &Request) -> Option<&TableRequestInfo> {
        request.attachments.get::<TableRequestInfo>(TABLE_INFO_KEY)
    }

    pub fn of_mut(request: &mut Request) -> Option<&mut TableRequestInfo> {
        request.attachments.get_mut::<TableRequestInfo>(TABLE_INFO_KEY)
    }
}

/// Instance OID `<root>.1.<column>.<index>`.
pub fn instance_oid(root: &Oid, column: u32, index: &Oid) -> crate::Result<Oid> {
    let mut oid = root.clone();
    oid.extend_from_slice(&[1, column])?;
    oid.extend_from_slice(index.arcs())?;
    Ok(oid)
}

/// A registration whose chain starts with a [`TableResolver`] for `info`.
pub fn table_registration(
    name: impl Into<String>,
    root: Oid,
    info: TableRegistrationInfo,
    leaf: Handler,
) -> HandlerRegistration {
    let mut registration = HandlerRegistration::new(name, root, leaf);
    registration.inject(TableResolver::handler(info));
    registration
}

/// Find the first cell after `(column, index)` in column-major order.
///
/// `index` of `None` means "start of the column". Rows are taken from
/// `rows`; `accept` decides whether a row has a value in a column. Returns
/// the column and row index of the cell, or `None` past the last column.
pub(crate) fn next_cell<V>(
    info: &TableRegistrationInfo,
    rows: &mut OrderedIndexArray<V>,
    column: u32,
    index: Option<&Oid>,
    mut accept: impl FnMut(u32, &V) -> bool,
) -> Option<(u32, Oid)> {
    let mut column = info.next_column(column)?;
    let mut cursor = index.cloned();
    loop {
        let candidate = match &cursor {
            Some(index) => rows.get_next(index),
            None => rows.first(),
        }
        .map(|(k, v)| (k.clone(), accept(column, v)));

        match candidate {
            Some((key, true)) => return Some((column, key)),
            Some((key, false)) => cursor = Some(key),
            None => {
                column = info.next_column(column.checked_add(1)?)?;
                cursor = None;
            }
        }
    }
}

//! Sparse column sets.

/// One node of a column set: an inclusive range or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnInfo {
    Range { lo: u32, hi: u32 },
    /// Ascending column numbers.
    List(Vec<u32>),
}

impl ColumnInfo {
    fn contains(&self, column: u32) -> bool {
        match self {
            ColumnInfo::Range { lo, hi } => (*lo..=*hi).contains(&column),
            ColumnInfo::List(columns) => columns.binary_search(&column).is_ok(),
        }
    }

    /// Smallest member of this node that is `>= column`.
    fn at_or_after(&self, column: u32) -> Option<u32> {
        match self {
            ColumnInfo::Range { lo, hi } if column <= *hi => Some(column.max(*lo)),
            ColumnInfo::Range { .. } => None,
            ColumnInfo::List(columns) => {
                let pos = columns.partition_point(|c| *c < column);
                columns.get(pos).copied()
            }
        }
    }
}

/// The columns a table actually implements.
///
/// Tables whose columns are not contiguous (deprecated columns, or columns
/// implemented elsewhere) list their valid columns so GETNEXT can step over
/// the gaps.
///
/// ```rust
/// use snmp_dispatch::table::ColumnSet;
///
/// let columns = ColumnSet::new().range(2, 4).list([7, 9]);
/// assert_eq!(columns.closest_column(5), Some(7));
/// assert_eq!(columns.closest_column(10), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    nodes: Vec<ColumnInfo>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the inclusive range `lo..=hi`.
    pub fn range(mut self, lo: u32, hi: u32) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.nodes.push(ColumnInfo::Range { lo, hi });
        self
    }

    /// Add an explicit list of columns.
    pub fn list(mut self, columns: impl IntoIterator<Item = u32>) -> Self {
        let mut columns: Vec<u32> = columns.into_iter().collect();
        columns.sort_unstable();
        columns.dedup();
        self.nodes.push(ColumnInfo::List(columns));
        self
    }

    pub fn nodes(&self) -> &[ColumnInfo] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| match n {
            ColumnInfo::Range { .. } => false,
            ColumnInfo::List(columns) => columns.is_empty(),
        })
    }

    pub fn contains(&self, column: u32) -> bool {
        self.nodes.iter().any(|n| n.contains(column))
    }

    /// The smallest valid column `>= column`, or `None` past the last one.
    ///
    /// Every node is consulted, so nodes may be given in any order.
    pub fn closest_column(&self, column: u32) -> Option<u32> {
        self.nodes.iter().filter_map(|n| n.at_or_after(column)).min()
    }

    /// Smallest valid column.
    pub fn first(&self) -> Option<u32> {
        self.closest_column(0)
    }
}

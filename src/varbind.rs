//! Request varbinds.
//!
//! Handlers read the OID of a [`VarBind`] to find the object asked for and
//! answer by replacing its value, either with data or with one of the
//! [`Exception`] values.

use std::fmt;

use crate::oid::Oid;
use crate::value::{Exception, Value};

/// An OID and the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// An unanswered varbind, as found in GET and GETNEXT requests.
    pub fn null(oid: Oid) -> Self {
        Self::new(oid, Value::Null)
    }

    /// A varbind answered with an exception instead of data.
    pub fn exception(oid: Oid, exception: Exception) -> Self {
        Self::new(oid, exception.into())
    }
}

/// Formats as `oid = TYPE: value`, or `oid = exception` when the varbind
/// carries no data.
impl fmt::Display for VarBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_exception() || self.value == Value::Null {
            write!(f, "{} = {}", self.oid, self.value)
        } else {
            write!(f, "{} = {}: {}", self.oid, self.value.value_type(), self.value)
        }
    }
}

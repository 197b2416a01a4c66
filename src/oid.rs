//! Object Identifier (OID) type.
//!
//! OIDs are stored inline for up to 16 arcs, which covers nearly every
//! instance OID an agent sees, and spill to the heap beyond that.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{Error, OidErrorKind, Result};

/// Maximum number of arcs in an OID (RFC 2578 Section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Ordering is lexicographic over the arcs compared as unsigned integers, with a
/// proper prefix sorting before any of its extensions:
/// `1.3.6.1.2` < `1.3.6.1.2.1` < `1.3.6.1.3`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse dotted notation such as `1.3.6.1.2.1` or `.1.3.6.1.2.1`.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in trimmed.split('.') {
            let arc = part
                .parse::<u32>()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }

        Ok(Self { arcs })
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Returns `true` if the OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Returns `true` if `prefix` is a (not necessarily proper) prefix of this OID.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// The arc at `position`, if present.
    pub fn get(&self, position: usize) -> Option<u32> {
        self.arcs.get(position).copied()
    }

    /// Arcs after the first `len` arcs (empty if the OID is shorter).
    pub fn suffix(&self, len: usize) -> &[u32] {
        self.arcs.get(len..).unwrap_or(&[])
    }

    /// Return a new OID with one more arc.
    pub fn child(&self, arc: u32) -> Result<Oid> {
        let mut oid = self.clone();
        oid.push(arc)?;
        Ok(oid)
    }

    /// Append one arc, enforcing [`MAX_OID_LEN`].
    pub fn push(&mut self, arc: u32) -> Result<()> {
        self.extend_from_slice(&[arc])
    }

    /// Append arcs, enforcing [`MAX_OID_LEN`].
    pub fn extend_from_slice(&mut self, arcs: &[u32]) -> Result<()> {
        let count = self.arcs.len() + arcs.len();
        if count > MAX_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                count,
                max: MAX_OID_LEN,
            }));
        }
        self.arcs.extend_from_slice(arcs);
        Ok(())
    }

    /// Shorten the OID to `len` arcs.
    pub fn truncate(&mut self, len: usize) {
        self.arcs.truncate(len);
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.arcs.as_slice().cmp(other.arcs.as_slice())
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl AsRef<[u32]> for Oid {
    fn as_ref(&self) -> &[u32] {
        &self.arcs
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```rust
/// use snmp_dispatch::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc as u32),*])
    };
}

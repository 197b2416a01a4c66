//! Request processing modes.

use std::fmt;

/// The mode a handler chain is invoked in.
///
/// Read requests use a single mode per PDU. A SET PDU is driven through up to
/// six modes, each applied to the whole varbind list before the next begins:
///
/// ```text
/// RESERVE1 -> RESERVE2 -> ACTION -> COMMIT -> FREE
///     |           |          |
///     +-> FREE    +-> FREE   +-> UNDO -> FREE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Get,
    GetNext,
    GetBulk,
    /// Check types, lengths and writability. No data may change.
    SetReserve1,
    /// Allocate resources and snapshot values needed for UNDO.
    SetReserve2,
    /// Apply the new value; must remain reversible.
    SetAction,
    /// Make the ACTION value final and release the undo snapshot.
    SetCommit,
    /// Revert ACTION using the RESERVE2 snapshot.
    SetUndo,
    /// Release anything still held for the request.
    SetFree,
}

impl Mode {
    /// Returns `true` for the six SET phases.
    pub fn is_set(self) -> bool {
        !self.is_read()
    }

    /// Returns `true` for GET, GETNEXT and GETBULK.
    pub fn is_read(self) -> bool {
        matches!(self, Mode::Get | Mode::GetNext | Mode::GetBulk)
    }

    /// Returns `true` for GETNEXT and GETBULK, which search forward from the OID.
    pub fn is_getnext_like(self) -> bool {
        matches!(self, Mode::GetNext | Mode::GetBulk)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Get => "GET",
            Mode::GetNext => "GETNEXT",
            Mode::GetBulk => "GETBULK",
            Mode::SetReserve1 => "RESERVE1",
            Mode::SetReserve2 => "RESERVE2",
            Mode::SetAction => "ACTION",
            Mode::SetCommit => "COMMIT",
            Mode::SetUndo => "UNDO",
            Mode::SetFree => "FREE",
        };
        f.write_str(name)
    }
}

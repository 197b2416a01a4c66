//! Per-varbind request state.

use std::any::Any;

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::value::{Exception, Value};
use crate::varbind::VarBind;

use super::{AttachmentList, Mode};

/// One varbind of a PDU as it travels down a handler chain.
///
/// A request lives for one PDU cycle; for SET PDUs that spans every phase, so
/// state attached in RESERVE1 is still present at FREE.
#[derive(Debug)]
pub struct Request {
    /// The varbind; handlers fill in the value (or rewrite the OID for GETNEXT).
    pub varbind: VarBind,
    /// Keyed state shared between handlers of the chain.
    pub attachments: AttachmentList,
    state_reference: Option<Box<dyn Any + Send>>,
    processed: bool,
    delegated: bool,
    status: ErrorStatus,
    index: usize,
}

impl Request {
    /// Create a request for the varbind at position `index` (0-based) of its PDU.
    pub fn new(index: usize, varbind: VarBind) -> Self {
        Self {
            varbind,
            attachments: AttachmentList::new(),
            state_reference: None,
            processed: false,
            delegated: false,
            status: ErrorStatus::NoError,
            index,
        }
    }

    /// Position of the varbind in the PDU.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn oid(&self) -> &Oid {
        &self.varbind.oid
    }

    pub fn value(&self) -> &Value {
        &self.varbind.value
    }

    /// Whether a handler has finished with this request for the current pass.
    ///
    /// Helpers skip processed requests.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn mark_processed(&mut self) {
        self.processed = true;
    }

    /// Clear the processed latch at the start of a new pass (e.g. the next SET phase).
    pub fn begin_pass(&mut self) {
        self.processed = false;
    }

    /// Whether completion has been deferred to a continuation.
    pub fn is_delegated(&self) -> bool {
        self.delegated
    }

    pub fn set_delegated(&mut self, delegated: bool) {
        self.delegated = delegated;
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Answer the request with `value` and mark it processed.
    pub fn set_value(&mut self, value: Value) {
        self.varbind.value = value;
        self.processed = true;
    }

    /// Record an error status and mark the request processed.
    pub fn set_error(&mut self, status: ErrorStatus) {
        self.status = status;
        self.processed = true;
    }

    /// Answer with an exception value.
    ///
    /// In read modes the exception replaces the varbind value. SET phases cannot
    /// carry exceptions, so the request fails with `noCreation` instead.
    pub fn set_exception(&mut self, mode: Mode, exception: Exception) {
        if mode.is_set() {
            self.set_error(ErrorStatus::NoCreation);
        } else {
            self.set_value(exception.into());
        }
    }

    /// Store state that must survive from one SET phase to the next.
    pub fn set_state<T: Any + Send>(&mut self, state: T) {
        self.state_reference = Some(Box::new(state));
    }

    /// Borrow the stored state if it has type `T`.
    pub fn state_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.state_reference.as_mut()?.downcast_mut::<T>()
    }

    /// Take the stored state, leaving the slot empty.
    ///
    /// Returns `None` if nothing is stored or the type differs; in the latter
    /// case the state is left in place.
    pub fn take_state<T: Any>(&mut self) -> Option<T> {
        match self.state_reference.take()?.downcast::<T>() {
            Ok(state) => Some(*state),
            Err(other) => {
                self.state_reference = Some(other);
                None
            }
        }
    }

    pub fn has_state(&self) -> bool {
        self.state_reference.is_some()
    }

    /// Release attachments and state at the end of the request cycle.
    pub fn finish(&mut self) {
        self.attachments.free_all();
        self.state_reference = None;
    }
}

//! Result types for handler callbacks.

use crate::error::ErrorStatus;

use super::ContinuationToken;

/// How a handler left the batch it was given.
#[derive(Debug)]
pub enum Dispatch {
    /// Every request this handler is responsible for has been dealt with.
    Complete,
    /// Some requests were delegated; each token resumes one continuation.
    Suspended(Vec<ContinuationToken>),
}

impl Dispatch {
    /// A single suspended continuation.
    pub fn suspended(token: ContinuationToken) -> Self {
        Dispatch::Suspended(vec![token])
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Dispatch::Complete)
    }

    /// Combine the outcomes of two calls made for the same batch.
    pub fn merge(self, other: Dispatch) -> Dispatch {
        match (self, other) {
            (Dispatch::Complete, other) => other,
            (this, Dispatch::Complete) => this,
            (Dispatch::Suspended(mut a), Dispatch::Suspended(b)) => {
                a.extend(b);
                Dispatch::Suspended(a)
            }
        }
    }

    /// The pending continuations, empty when complete.
    pub fn into_continuations(self) -> Vec<ContinuationToken> {
        match self {
            Dispatch::Complete => Vec::new(),
            Dispatch::Suspended(tokens) => tokens,
        }
    }
}

/// Outcome of a handler callback.
///
/// `Err` carries a non-`noError` status and short-circuits the rest of the
/// chain; handlers still release their own per-call state before returning it.
pub type HandlerResult = std::result::Result<Dispatch, ErrorStatus>;

//! Subtree registry mapping OIDs to registrations.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::handler::HandlerRegistration;
use crate::oid::Oid;

/// Lookup structure used by the dispatcher to route requests.
///
/// Implementations hold registrations keyed by (context, root). The dispatcher
/// only ever asks two questions: which registration owns an OID, and which is
/// the first one after it.
pub trait SubtreeRegistry: Send + Sync {
    /// Add a registration. Fails if the same context, root and priority is taken.
    fn register(&mut self, registration: Arc<HandlerRegistration>) -> Result<()>;

    /// Remove the registration with `name` under `root`, returning it if present.
    fn unregister(
        &mut self,
        context: Option<&str>,
        root: &Oid,
        name: &str,
    ) -> Option<Arc<HandlerRegistration>>;

    /// The registration whose subtree contains `oid`.
    ///
    /// The longest root wins; among equal roots the lowest priority value wins.
    fn find(&self, context: Option<&str>, oid: &Oid) -> Option<Arc<HandlerRegistration>>;

    /// The first registration whose root sorts after `oid` and does not contain it.
    fn find_next(&self, context: Option<&str>, oid: &Oid) -> Option<Arc<HandlerRegistration>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory registry kept sorted by root.
#[derive(Debug, Default)]
pub struct OidRegistry {
    entries: Vec<Arc<HandlerRegistration>>,
}

impl OidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_context<'a>(
        &'a self,
        context: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Arc<HandlerRegistration>> + 'a {
        self.entries.iter().filter(move |r| r.context() == context)
    }
}

impl SubtreeRegistry for OidRegistry {
    fn register(&mut self, registration: Arc<HandlerRegistration>) -> Result<()> {
        let clash = self.entries.iter().any(|r| {
            r.context() == registration.context()
                && r.root() == registration.root()
                && r.priority() == registration.priority()
        });
        if clash {
            return Err(Error::DuplicateRegistration {
                name: registration.name().to_string(),
                root: registration.root().clone(),
                context: registration.context().map(str::to_string),
            });
        }

        let pos = self.entries.partition_point(|r| {
            (r.root(), r.priority()) <= (registration.root(), registration.priority())
        });
        self.entries.insert(pos, registration);
        Ok(())
    }

    fn unregister(
        &mut self,
        context: Option<&str>,
        root: &Oid,
        name: &str,
    ) -> Option<Arc<HandlerRegistration>> {
        let pos = self
            .entries
            .iter()
            .position(|r| r.context() == context && r.root() == root && r.name() == name)?;
        Some(self.entries.remove(pos))
    }

    fn find(&self, context: Option<&str>, oid: &Oid) -> Option<Arc<HandlerRegistration>> {
        self.in_context(context)
            .filter(|r| r.contains(oid))
            .min_by(|a, b| {
                b.root()
                    .len()
                    .cmp(&a.root().len())
                    .then(a.priority().cmp(&b.priority()))
            })
            .cloned()
    }

    fn find_next(&self, context: Option<&str>, oid: &Oid) -> Option<Arc<HandlerRegistration>> {
        // Entries are sorted by root, so the first qualifying one is the closest.
        self.in_context(context)
            .find(|r| r.root() > oid && !r.contains(oid))
            .cloned()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

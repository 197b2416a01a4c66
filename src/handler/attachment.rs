//! Per-request attachments.
//!
//! Handlers in a chain pass state to each other by attaching typed values to a
//! [`Request`](super::Request) under a string key. A value may carry a free
//! callback; it runs exactly once, either when the owner calls
//! [`AttachmentList::free`] or when the list itself is released at the end of
//! the request cycle.

use std::any::Any;
use std::fmt;

type FreeFn = Box<dyn FnOnce(Box<dyn Any + Send>) + Send>;

struct Attachment {
    key: &'static str,
    value: Box<dyn Any + Send>,
    on_free: Option<FreeFn>,
}

impl Attachment {
    fn release(self) {
        if let Some(on_free) = self.on_free {
            on_free(self.value);
        }
    }
}

/// Keyed heterogeneous storage attached to one request.
#[derive(Default)]
pub struct AttachmentList {
    entries: Vec<Attachment>,
}

impl AttachmentList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value` under `key`, releasing any previous value under that key.
    pub fn insert<T: Any + Send>(&mut self, key: &'static str, value: T) {
        self.push(key, Box::new(value), None);
    }

    /// Attach `value` with a callback run once when the value is released.
    pub fn insert_with_free<T, F>(&mut self, key: &'static str, value: T, on_free: F)
    where
        T: Any + Send,
        F: FnOnce(T) + Send + 'static,
    {
        let on_free: FreeFn = Box::new(move |value: Box<dyn Any + Send>| {
            if let Ok(value) = value.downcast::<T>() {
                on_free(*value);
            }
        });
        self.push(key, Box::new(value), Some(on_free));
    }

    fn push(&mut self, key: &'static str, value: Box<dyn Any + Send>, on_free: Option<FreeFn>) {
        self.free(key);
        self.entries.push(Attachment {
            key,
            value,
            on_free,
        });
    }

    /// Borrow the value under `key` if it has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| a.value.downcast_ref::<T>())
    }

    /// Mutably borrow the value under `key` if it has type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|a| a.key == key)
            .and_then(|a| a.value.downcast_mut::<T>())
    }

    /// Detach and return the value under `key` without running its free callback.
    ///
    /// Returns `None` (and leaves the entry in place) if the stored type is not `T`.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let pos = self
            .entries
            .iter()
            .position(|a| a.key == key && a.value.is::<T>())?;
        let entry = self.entries.remove(pos);
        entry.value.downcast::<T>().ok().map(|v| *v)
    }

    /// Detach the value under `key` and run its free callback.
    ///
    /// Returns `true` if an entry was present.
    pub fn free(&mut self, key: &str) -> bool {
        match self.entries.iter().position(|a| a.key == key) {
            Some(pos) => {
                self.entries.remove(pos).release();
                true
            }
            None => false,
        }
    }

    /// Release every entry, running free callbacks in attachment order.
    pub fn free_all(&mut self) {
        for entry in self.entries.drain(..) {
            entry.release();
        }
    }

    /// Returns `true` if something is attached under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|a| a.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for AttachmentList {
    fn drop(&mut self) {
        self.free_all();
    }
}

impl fmt::Debug for AttachmentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|a| a.key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce(u32) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_attachment_typed_access() {
        let mut list = AttachmentList::new();
        list.insert("n", 5u32);
        list.insert("s", String::from("row"));

        assert_eq!(list.get::<u32>("n"), Some(&5));
        assert_eq!(list.get::<String>("n"), None);
        *list.get_mut::<u32>("n").unwrap() += 1;
        assert_eq!(list.remove::<u32>("n"), Some(6));
        assert!(!list.contains("n"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_attachment_free_runs_once() {
        let (count, on_free) = counter();
        let mut list = AttachmentList::new();
        list.insert_with_free("undo", 1u32, on_free);

        assert!(list.free("undo"));
        assert!(!list.free("undo"));
        list.free_all();
        drop(list);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attachment_drop_releases() {
        let (count, on_free) = counter();
        {
            let mut list = AttachmentList::new();
            list.insert_with_free("undo", 1u32, on_free);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attachment_remove_skips_free() {
        let (count, on_free) = counter();
        let mut list = AttachmentList::new();
        list.insert_with_free("undo", 9u32, on_free);
        assert_eq!(list.remove::<u32>("undo"), Some(9));
        drop(list);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_attachment_replace_releases_previous() {
        let (count, on_free) = counter();
        let mut list = AttachmentList::new();
        list.insert_with_free("k", 1u32, on_free);
        list.insert("k", 2u32);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(list.get::<u32>("k"), Some(&2));
    }
}

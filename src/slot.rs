//! Last-write-wins storage for a resource that is loaded asynchronously.
//!
//! Each load takes a `Ticket` before it sends its request. When the response arrives it is only
//! applied if no newer load has been applied in the meantime, so a slow response can never
//! overwrite a fresher one.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// The sequence number of a load, taken before the request is sent. `Ticket::default()` comes
/// before every issued ticket.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) struct Ticket(u64);

#[derive(Debug, Default)]
struct Inner<T> {
    value: T,
    issued: u64,
    applied: u64,
}

/// Holds the current value of a resource along with its load sequence numbers.
#[derive(Debug, Default)]
pub(crate) struct Slot<T> {
    name: &'static str,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone + Default> Slot<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues the ticket for a new load.
    pub(crate) fn begin(&self) -> Ticket {
        let mut inner = self.lock();
        inner.issued += 1;
        Ticket(inner.issued)
    }

    /// Applies `value` if `ticket` is newer than whatever was applied last. Returns whether it was
    /// applied.
    pub(crate) fn finish(&self, ticket: Ticket, value: T) -> bool {
        let mut inner = self.lock();
        if ticket.0 <= inner.applied {
            debug!(
                "Discarding {} load #{}, load #{} is newer",
                self.name, ticket.0, inner.applied
            );
            return false;
        }
        inner.value = value;
        inner.applied = ticket.0;
        true
    }

    /// The ticket of the most recently started load.
    pub(crate) fn issued(&self) -> Ticket {
        Ticket(self.lock().issued)
    }

    /// The ticket of the load whose value is held now.
    pub(crate) fn applied(&self) -> Ticket {
        Ticket(self.lock().applied)
    }

    /// A copy of the current value.
    pub(crate) fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Runs `f` against the current value without copying it.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// Whether any load has been applied yet.
    pub(crate) fn is_loaded(&self) -> bool {
        self.lock().applied > 0
    }
}

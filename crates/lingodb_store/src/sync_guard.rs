//! Mutual exclusion between remote-apply and local-apply code paths.
//!
//! A pull-triggered working-copy reload racing with a push-triggered slot
//! write can interleave and produce a state matching neither the local nor
//! the remote content. Both paths therefore take the same [`SyncGuard`]
//! for the duration of their critical section. Reads never take it.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A cloneable handle to one store group's sync critical section.
///
/// Cheap to clone; all clones share the same underlying lock.
#[derive(Clone, Default)]
pub struct SyncGuard {
    inner: Arc<Mutex<()>>,
}

impl SyncGuard {
    /// Creates a new guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the critical section, blocking until it is free.
    ///
    /// The permit releases the section when dropped, including on panic
    /// and early-return error paths.
    pub fn acquire(&self) -> SyncPermit<'_> {
        SyncPermit {
            _guard: self.inner.lock(),
        }
    }
}

impl std::fmt::Debug for SyncGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGuard").finish_non_exhaustive()
    }
}

/// An acquired sync permit. Held for the duration of a pull-apply or
/// push-apply critical section.
pub struct SyncPermit<'a> {
    _guard: MutexGuard<'a, ()>,
}

//! Checkpoints keying the document-level change stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// An opaque, monotonically-usable marker meaning "all changes before me
/// are already known" in the pull protocol.
///
/// Represented as epoch milliseconds, bumped past the previously issued
/// value when the wall clock stalls so consecutive checkpoints never
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checkpoint(u64);

impl Checkpoint {
    /// Issues a fresh checkpoint, strictly greater than any previously
    /// issued in this process.
    pub fn now() -> Self {
        static LAST: AtomicU64 = AtomicU64::new(0);

        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut prev = LAST.load(Ordering::SeqCst);
        loop {
            let next = wall.max(prev + 1);
            match LAST.compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return Checkpoint(next),
                Err(actual) => prev = actual,
            }
        }
    }

    /// Returns the checkpoint as epoch milliseconds.
    #[must_use]
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Checkpoint {
    fn from(millis: u64) -> Self {
        Checkpoint(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoints_are_strictly_increasing() {
        let a = Checkpoint::now();
        let b = Checkpoint::now();
        let c = Checkpoint::now();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn round_trips_through_millis() {
        let checkpoint = Checkpoint::from(1234);
        assert_eq!(checkpoint.as_millis(), 1234);
    }
}

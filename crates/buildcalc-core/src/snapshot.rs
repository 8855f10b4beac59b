//! Hypothetical evaluation over value snapshots.
//!
//! Every resource subsystem is plain data, so a "what if" question is
//! answered by copying the subsystem, mutating the copy and dropping it. The
//! closure only ever sees the copy; the real state cannot be touched.

/// Snapshot / evaluate / discard.
pub trait WhatIf: Clone {
    fn what_if<R>(&self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut snapshot = self.clone();
        f(&mut snapshot)
    }
}

impl<T: Clone> WhatIf for T {}

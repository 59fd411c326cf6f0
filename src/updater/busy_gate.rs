use std::sync::atomic::{AtomicBool, Ordering};

/// Single flag shared by every workflow that must not overlap.
///
/// This is not a counter and has no queue: acquiring a held gate fails immediately.
#[derive(Debug, Default)]
pub struct BusyGate {
    busy: AtomicBool,
}

impl BusyGate {
    pub fn try_acquire(&self) -> bool {
        self.busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Acquire the gate, handing back a guard that releases it when dropped.
    pub fn try_lock(&self) -> Option<BusyGuard<'_>> {
        self.try_acquire().then(|| BusyGuard { gate: self })
    }
}

pub struct BusyGuard<'a> {
    gate: &'a BusyGate,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

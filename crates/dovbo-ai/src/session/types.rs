//! Run gate guard.

use std::sync::atomic::Ordering;

use super::manager::Session;

/// Holds a session's run gate. Dropping it clears the active-run marker,
/// releases the gate and wakes waiters, so the gate is released on every
/// exit path including errors and cancellation.
pub struct RunGuard<'a> {
    pub(super) session: &'a Session,
}

impl<'a> RunGuard<'a> {
    /// Attempt to take the gate. Returns `None` if a run is already active.
    pub(super) fn acquire(session: &'a Session) -> Option<Self> {
        session
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { session })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.session.clear_active_run();
        self.session.busy.store(false, Ordering::Release);
        self.session.idle.notify_waiters();
    }
}

//! Reentrancy guard for replayed packets

use std::cell::Cell;

thread_local! {
    static REPLAYING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as replaying a packet into the host
///
/// While the guard is alive, the receive interception point lets frames
/// through untouched. The previous state is restored on drop, including
/// during unwinding.
#[must_use = "the guard is released as soon as it is dropped"]
pub struct ReplayGuard {
    previous: bool,
}

impl ReplayGuard {
    pub fn enter() -> Self {
        let previous = REPLAYING.with(|flag| flag.replace(true));
        Self { previous }
    }

    /// Whether this thread is inside a replay
    pub fn is_active() -> bool {
        REPLAYING.with(Cell::get)
    }
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        REPLAYING.with(|flag| flag.set(self.previous));
    }
}

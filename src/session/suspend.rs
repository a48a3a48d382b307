//! Live-editing latch and scoped suspension
//!
//! The latch is shared between the session and any open [`Suspension`]
//! guards. A guard disarms the latch on creation and restores the previous
//! state when dropped, which also happens while unwinding.

use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// Armed/disarmed state of the rebind detector
#[derive(Debug, Clone)]
pub struct LiveSwitch {
    armed: Rc<Cell<bool>>,
}

impl LiveSwitch {
    pub fn new(armed: bool) -> Self {
        Self {
            armed: Rc::new(Cell::new(armed)),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    pub fn set(&self, armed: bool) {
        self.armed.set(armed);
    }

    /// Disarm until the returned guard is dropped or resumed
    pub fn suspend(&self) -> Suspension {
        let previous = self.armed.replace(false);
        trace!("Live editing suspended");
        Suspension {
            armed: Rc::clone(&self.armed),
            previous,
        }
    }
}

impl Default for LiveSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Guard keeping live editing disarmed
#[must_use = "live editing resumes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct Suspension {
    armed: Rc<Cell<bool>>,
    previous: bool,
}

impl Suspension {
    /// Explicit end of the suspended scope
    pub fn resume(self) {}
}

impl Drop for Suspension {
    fn drop(&mut self) {
        self.armed.set(self.previous);
        trace!("Live editing restored to {}", self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_guard_restores_on_drop() {
        let switch = LiveSwitch::default();
        {
            let _pause = switch.suspend();
            assert!(!switch.is_armed());
        }
        assert!(switch.is_armed());
    }

    #[test]
    fn test_resume_consumes_guard() {
        let switch = LiveSwitch::default();
        let pause = switch.suspend();
        pause.resume();
        assert!(switch.is_armed());
    }

    #[test]
    fn test_suspension_keeps_explicitly_disabled_state() {
        let switch = LiveSwitch::new(false);
        drop(switch.suspend());
        assert!(!switch.is_armed());
    }

    #[test]
    fn test_guard_restores_while_unwinding() {
        let switch = LiveSwitch::default();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _pause = switch.suspend();
            panic!("scrub failed");
        }));
        assert!(result.is_err());
        assert!(switch.is_armed());
    }
}

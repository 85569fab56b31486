use crate::backend::Backend;
use crate::SleepInhibitor;

/// The "keep awake" toggle a UI owns, with edge detection.
///
/// Flip it as often as you like; [`sync`](Self::sync) talks to the inhibitor only
/// when the desired state differs from the one last applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeepAwakeSwitch {
    desired: bool,
    applied: bool,
}

impl KeepAwakeSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.desired
    }

    pub fn set(&mut self, on: bool) {
        self.desired = on;
    }

    pub fn toggle(&mut self) {
        self.desired = !self.desired;
    }

    /// Call once per frame or loop iteration.
    ///
    /// Returns `None` when nothing changed, otherwise the result of the
    /// `enable`/`disable` call made for the transition. The transition counts as
    /// observed either way; retrying a failure means toggling again.
    pub fn sync<B: Backend>(&mut self, inhibitor: &mut SleepInhibitor<B>) -> Option<bool> {
        if self.desired == self.applied {
            return None;
        }
        self.applied = self.desired;
        Some(if self.desired {
            inhibitor.enable()
        } else {
            inhibitor.disable()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inhibitor::tests::{Call, FakeBackend};

    #[test]
    fn nothing_happens_without_a_transition() {
        let (backend, calls) = FakeBackend::new();
        let mut inhibitor = SleepInhibitor::new(backend);
        let mut switch = KeepAwakeSwitch::new();
        assert_eq!(switch.sync(&mut inhibitor), None);
        switch.set(false);
        assert_eq!(switch.sync(&mut inhibitor), None);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn each_transition_is_applied_once() {
        let (backend, calls) = FakeBackend::new();
        let mut inhibitor = SleepInhibitor::new(backend);
        let mut switch = KeepAwakeSwitch::new();

        switch.toggle();
        assert_eq!(switch.sync(&mut inhibitor), Some(true));
        assert_eq!(switch.sync(&mut inhibitor), None);
        assert!(inhibitor.is_active());

        switch.toggle();
        assert_eq!(switch.sync(&mut inhibitor), Some(true));
        assert_eq!(switch.sync(&mut inhibitor), None);
        assert!(!inhibitor.is_active());

        assert_eq!(*calls.borrow(), vec![Call::Acquire, Call::Release(1)]);
    }

    #[test]
    fn flicker_between_syncs_is_not_a_transition() {
        let (backend, calls) = FakeBackend::new();
        let mut inhibitor = SleepInhibitor::new(backend);
        let mut switch = KeepAwakeSwitch::new();
        switch.set(true);
        switch.set(false);
        assert_eq!(switch.sync(&mut inhibitor), None);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn failed_enable_is_reported_and_not_retried() {
        let (mut backend, calls) = FakeBackend::new();
        backend.fail_acquire = true;
        let mut inhibitor = SleepInhibitor::new(backend);
        let mut switch = KeepAwakeSwitch::new();
        switch.set(true);
        assert_eq!(switch.sync(&mut inhibitor), Some(false));
        assert_eq!(switch.sync(&mut inhibitor), None);
        assert!(switch.is_on());
        assert!(!inhibitor.is_active());
        assert_eq!(*calls.borrow(), vec![Call::Acquire]);
    }
}

use log::{debug, warn};

use crate::backend::Backend;

/// A single on/off switch over the operating system's idle sleep policy.
///
/// Starts inactive. While active it holds exactly one grant from its backend, and
/// it gives that grant back when dropped so inhibition never outlives the value.
///
/// Not thread safe by itself: it is meant to be driven from the thread running
/// the event loop. Wrap it in a lock if several threads need it.
pub struct SleepInhibitor<B: Backend> {
    backend: B,
    grant: Option<B::Grant>,
}

impl<B: Backend> SleepInhibitor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            grant: None,
        }
    }

    /// Ask the platform to keep the machine awake.
    ///
    /// Returns `true` if inhibition is in effect afterwards. Calling this while
    /// already active returns `true` without asking the platform again.
    pub fn enable(&mut self) -> bool {
        if self.grant.is_some() {
            return true;
        }
        match self.backend.acquire() {
            Ok(grant) => {
                debug!("{} sleep inhibition acquired", B::PLATFORM_NAME);
                self.grant = Some(grant);
                true
            }
            Err(e) => {
                warn!("{} sleep inhibition failed: {e}", B::PLATFORM_NAME);
                false
            }
        }
    }

    /// Let the machine sleep again.
    ///
    /// Returns `false` if there was nothing to release, or if the backend could
    /// not release its grant (in which case the inhibitor stays active).
    pub fn disable(&mut self) -> bool {
        let Some(grant) = &self.grant else {
            return false;
        };
        match self.backend.release(grant) {
            Ok(()) => {
                debug!("{} sleep inhibition released", B::PLATFORM_NAME);
                self.grant = None;
                true
            }
            Err(e) => {
                warn!("{} sleep inhibition could not be released: {e}", B::PLATFORM_NAME);
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.grant.is_some()
    }

    pub fn platform_name(&self) -> &'static str {
        B::PLATFORM_NAME
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: Backend> Drop for SleepInhibitor<B> {
    fn drop(&mut self) {
        if self.is_active() {
            self.disable();
        }
    }
}

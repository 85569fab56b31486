//! Session bus inhibition with a helper process as the fallback.
//!
//! The bus path is tried first. If it fails for any reason (no connection, method
//! error, a reply that isn't a cookie) a helper process is launched instead. The
//! helper path is fire and forget: a successful launch counts as success, and
//! release cannot be confirmed, so [`SessionBusBackend::release`] never fails.

use std::ops::BitOr;

use log::{debug, info, warn};

use super::{Backend, Identity};
use crate::InhibitError;

/// Bit flags taken by the session manager's `Inhibit` call.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InhibitFlags {
    LogOut = 1,
    SwitchUser = 2,
    Suspend = 4,
    Idle = 8,
    AutoMount = 16,
}

impl BitOr for InhibitFlags {
    type Output = u32;

    fn bitor(self, rhs: Self) -> Self::Output {
        self as u32 | rhs as u32
    }
}

/// Flag word sent with every `Inhibit` call: suppress idle-triggered actions
/// only, not suspend or logout.
pub const INHIBIT_IDLE: u32 = InhibitFlags::Idle as u32;

/// A desktop session manager reachable over the session bus.
pub trait SessionManager {
    /// Returns the cookie identifying the new inhibition.
    fn inhibit(&self, app_id: &str, reason: &str, flags: u32) -> Result<u32, InhibitError>;

    fn uninhibit(&self, cookie: u32) -> Result<(), InhibitError>;
}

/// A detached process that blocks idle for as long as it runs.
pub trait IdleHelper {
    /// Launch the helper. Success only means the launch didn't fail right away.
    fn spawn(&mut self, identity: &Identity) -> Result<(), InhibitError>;

    /// Best-effort kill of every helper tagged with `identity`.
    fn terminate(&mut self, identity: &Identity);
}

/// What backs an active grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionGrant {
    Cookie(u32),
    Helper,
}

pub struct SessionBusBackend<S, H> {
    identity: Identity,
    bus: Option<S>,
    helper: H,
}

impl<S: SessionManager, H: IdleHelper> SessionBusBackend<S, H> {
    /// `bus` is `None` when the session bus couldn't be reached at startup; every
    /// request then goes straight to the helper.
    pub fn with_parts(identity: Identity, bus: Option<S>, helper: H) -> Self {
        Self {
            identity,
            bus,
            helper,
        }
    }

    pub fn has_bus(&self) -> bool {
        self.bus.is_some()
    }

    fn inhibit_over_bus(&self) -> Result<u32, InhibitError> {
        let bus = self.bus.as_ref().ok_or(InhibitError::Connection {
            service: "the session bus",
        })?;
        bus.inhibit(&self.identity.app_name, &self.identity.reason, INHIBIT_IDLE)
    }
}

#[cfg(target_os = "linux")]
impl SessionBusBackend<super::gnome::GnomeSessionManager, super::systemd::SystemdInhibit> {
    /// Connects to the GNOME session manager right away. If that fails the
    /// backend still works, through `systemd-inhibit` alone.
    pub fn new(identity: Identity) -> Self {
        Self::with_parts(
            identity,
            super::gnome::GnomeSessionManager::try_connect(),
            super::systemd::SystemdInhibit::new(),
        )
    }
}

impl<S: SessionManager, H: IdleHelper> Backend for SessionBusBackend<S, H> {
    type Grant = SessionGrant;

    const PLATFORM_NAME: &'static str = "Linux";

    fn acquire(&mut self) -> Result<SessionGrant, InhibitError> {
        match self.inhibit_over_bus() {
            Ok(cookie) => {
                debug!("session manager granted inhibit cookie {cookie}");
                return Ok(SessionGrant::Cookie(cookie));
            }
            Err(e) => info!("session bus inhibit unavailable ({e}), launching helper"),
        }
        self.helper.spawn(&self.identity)?;
        Ok(SessionGrant::Helper)
    }

    fn release(&mut self, grant: &SessionGrant) -> Result<(), InhibitError> {
        if let SessionGrant::Cookie(cookie) = *grant {
            match &self.bus {
                Some(bus) => {
                    if let Err(e) = bus.uninhibit(cookie) {
                        warn!("session manager refused to uninhibit cookie {cookie}: {e}");
                    }
                }
                None => warn!("no session bus to uninhibit cookie {cookie}"),
            }
        }
        // A helper may be left over from an earlier grant even when this one came
        // from the bus.
        self.helper.terminate(&self.identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::SleepInhibitor;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Event {
        Inhibit {
            app_id: String,
            reason: String,
            flags: u32,
        },
        Uninhibit(u32),
        Spawn(String),
        Terminate(String),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct FakeBus {
        log: Log,
        cookie: Option<u32>,
        fail_uninhibit: bool,
    }

    impl SessionManager for FakeBus {
        fn inhibit(&self, app_id: &str, reason: &str, flags: u32) -> Result<u32, InhibitError> {
            self.log.borrow_mut().push(Event::Inhibit {
                app_id: app_id.into(),
                reason: reason.into(),
                flags,
            });
            self.cookie.ok_or_else(|| InhibitError::MalformedReply {
                method: "Inhibit",
                reason: "expected a cookie".into(),
            })
        }

        fn uninhibit(&self, cookie: u32) -> Result<(), InhibitError> {
            self.log.borrow_mut().push(Event::Uninhibit(cookie));
            if self.fail_uninhibit {
                return Err(InhibitError::Release("no such cookie".into()));
            }
            Ok(())
        }
    }

    struct FakeHelper {
        log: Log,
        launches: Vec<bool>,
    }

    impl IdleHelper for FakeHelper {
        fn spawn(&mut self, identity: &Identity) -> Result<(), InhibitError> {
            self.log
                .borrow_mut()
                .push(Event::Spawn(identity.app_name.clone()));
            if self.launches.is_empty() || self.launches.remove(0) {
                Ok(())
            } else {
                Err(InhibitError::Spawn {
                    program: "systemd-inhibit",
                    source: io::Error::from(io::ErrorKind::NotFound),
                })
            }
        }

        fn terminate(&mut self, identity: &Identity) {
            self.log
                .borrow_mut()
                .push(Event::Terminate(identity.app_name.clone()));
        }
    }

    fn inhibitor(
        cookie: Option<u32>,
        with_bus: bool,
        launches: Vec<bool>,
    ) -> (SleepInhibitor<SessionBusBackend<FakeBus, FakeHelper>>, Log) {
        let log = Log::default();
        let bus = with_bus.then(|| FakeBus {
            log: Rc::clone(&log),
            cookie,
            fail_uninhibit: false,
        });
        let helper = FakeHelper {
            log: Rc::clone(&log),
            launches,
        };
        let backend = SessionBusBackend::with_parts(Identity::default(), bus, helper);
        (SleepInhibitor::new(backend), log)
    }

    #[test]
    fn bus_grant_is_released_with_its_own_cookie() {
        let (mut inhibitor, log) = inhibitor(Some(42), true, vec![]);
        assert!(inhibitor.enable());
        assert!(inhibitor.disable());
        assert!(!inhibitor.is_active());
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Inhibit {
                    app_id: "Caffeine".into(),
                    reason: "Preventing system sleep".into(),
                    flags: INHIBIT_IDLE,
                },
                Event::Uninhibit(42),
                Event::Terminate("Caffeine".into()),
            ]
        );
    }

    #[test]
    fn bus_failures_fall_back_to_the_helper_each_time() {
        let (mut inhibitor, log) = inhibitor(None, true, vec![false, true]);
        assert!(!inhibitor.enable());
        assert!(!inhibitor.is_active());
        assert!(inhibitor.enable());
        assert!(inhibitor.is_active());

        let log = log.borrow();
        let inhibits = log
            .iter()
            .filter(|e| matches!(e, Event::Inhibit { .. }))
            .count();
        let spawns = log.iter().filter(|e| matches!(e, Event::Spawn(_))).count();
        assert_eq!(inhibits, 2);
        assert_eq!(spawns, 2);
    }

    #[test]
    fn inhibit_requests_idle_suppression_only() {
        assert_eq!(INHIBIT_IDLE, 8);
        assert_eq!(INHIBIT_IDLE & (InhibitFlags::Suspend | InhibitFlags::LogOut), 0);
        assert_eq!(InhibitFlags::Suspend | InhibitFlags::Idle, 12);
    }

    #[test]
    fn missing_bus_goes_straight_to_the_helper() {
        let (mut inhibitor, log) = inhibitor(None, false, vec![]);
        assert!(!inhibitor.backend().has_bus());
        assert!(inhibitor.enable());
        assert_eq!(*log.borrow(), vec![Event::Spawn("Caffeine".into())]);
    }

    #[test]
    fn helper_grant_is_cleared_even_without_confirmation() {
        let (mut inhibitor, log) = inhibitor(None, false, vec![]);
        inhibitor.enable();
        assert!(inhibitor.disable());
        assert!(!inhibitor.is_active());
        assert!(!inhibitor.disable());
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Spawn("Caffeine".into()),
                Event::Terminate("Caffeine".into())
            ]
        );
    }

    #[test]
    fn refused_uninhibit_still_clears_the_grant() {
        let log = Log::default();
        let bus = FakeBus {
            log: Rc::clone(&log),
            cookie: Some(7),
            fail_uninhibit: true,
        };
        let helper = FakeHelper {
            log: Rc::clone(&log),
            launches: vec![],
        };
        let mut inhibitor = SleepInhibitor::new(SessionBusBackend::with_parts(
            Identity::default(),
            Some(bus),
            helper,
        ));
        assert!(inhibitor.enable());
        assert!(inhibitor.disable());
        assert!(!inhibitor.is_active());
        assert!(log.borrow().contains(&Event::Uninhibit(7)));
        assert!(log.borrow().contains(&Event::Terminate("Caffeine".into())));
    }

    #[test]
    fn dropping_an_active_inhibitor_uninhibits() {
        let (mut inhibitor, log) = inhibitor(Some(3), true, vec![]);
        inhibitor.enable();
        drop(inhibitor);
        assert!(log.borrow().contains(&Event::Uninhibit(3)));
    }
}

//! Platform strategies for holding off idle sleep.
//!
//! Exactly one of these is compiled in as [`NativeBackend`]:
//! - **Windows**: the thread execution-state flag (`SetThreadExecutionState`)
//! - **macOS**: an IOKit power-management assertion
//! - **Linux**: the GNOME session manager's `Inhibit` call over the session bus,
//!   falling back to a detached `systemd-inhibit` helper

use crate::InhibitError;

pub mod session;

#[cfg(target_os = "linux")]
pub mod gnome;
#[cfg(target_os = "linux")]
pub mod systemd;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub mod unsupported;

/// The strategy selected for the target this crate was built for.
#[cfg(target_os = "linux")]
pub type NativeBackend = session::SessionBusBackend<gnome::GnomeSessionManager, systemd::SystemdInhibit>;
#[cfg(target_os = "macos")]
pub type NativeBackend = macos::PowerAssertionBackend;
#[cfg(target_os = "windows")]
pub type NativeBackend = windows::ExecutionStateBackend;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub type NativeBackend = unsupported::UnsupportedBackend;

/// A way of acquiring and releasing one sleep inhibition grant.
///
/// Implementations only talk to the platform. Bookkeeping (idempotence, whether a
/// grant is currently held, releasing on drop) lives in
/// [`SleepInhibitor`](crate::SleepInhibitor).
pub trait Backend {
    /// Whatever the platform hands back to identify an active grant.
    type Grant;

    /// Name of the platform this strategy targets, fixed at build time.
    const PLATFORM_NAME: &'static str;

    fn acquire(&mut self) -> Result<Self::Grant, InhibitError>;

    /// Give `grant` back to the platform.
    ///
    /// Returning an error means the grant is still held and the caller keeps it.
    /// Best-effort strategies that cannot confirm a release should return `Ok`.
    fn release(&mut self, grant: &Self::Grant) -> Result<(), InhibitError>;
}

/// Who is asking for inhibition, and why. Shown by the platform in its list of
/// inhibitors and used to tag helper processes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub app_name: String,
    pub reason: String,
}

impl Identity {
    pub fn new(app_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            reason: reason.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("Caffeine", "Preventing system sleep")
    }
}

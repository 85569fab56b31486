//! Keep the computer awake.
//!
//! [`SleepInhibitor`] is a single on/off switch over the operating system's idle
//! sleep policy. The platform strategy behind it is picked at build time
//! ([`NativeBackend`]); tests and embedders can inject their own [`Backend`].
//!
//! ```no_run
//! use caffeine::{Identity, NativeInhibitor};
//!
//! let mut inhibitor = NativeInhibitor::native(Identity::default());
//! if inhibitor.enable() {
//!     println!("{} will stay awake", inhibitor.platform_name());
//! }
//! // Dropping the inhibitor lets the machine sleep again.
//! ```

pub mod backend;
mod error;
mod inhibitor;
mod toggle;

pub use backend::{Backend, Identity, NativeBackend};
pub use error::InhibitError;
pub use inhibitor::SleepInhibitor;
pub use toggle::KeepAwakeSwitch;

/// Inhibitor over the strategy compiled in for this platform.
pub type NativeInhibitor = SleepInhibitor<NativeBackend>;

/// Name of the platform strategy compiled into this build.
pub const PLATFORM_NAME: &str = <NativeBackend as Backend>::PLATFORM_NAME;

impl SleepInhibitor<NativeBackend> {
    pub fn native(identity: Identity) -> Self {
        Self::new(NativeBackend::new(identity))
    }
}

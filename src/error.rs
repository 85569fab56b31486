use thiserror::Error;

/// Everything that can go wrong while asserting or releasing sleep inhibition.
///
/// These never escape [`SleepInhibitor`](crate::SleepInhibitor): it logs them and
/// reports a plain `bool` to its caller.
#[derive(Debug, Error)]
pub enum InhibitError {
    /// The platform service (session bus, power manager) could not be reached.
    #[error("could not reach {service}")]
    Connection { service: &'static str },
    /// The platform declined to grant inhibition.
    #[error("sleep inhibition was refused: {0}")]
    Acquire(String),
    /// Releasing a previously granted inhibition failed.
    #[error("could not release sleep inhibition: {0}")]
    Release(String),
    /// The service answered, but not with what was asked for.
    #[error("malformed reply from {method}: {reason}")]
    MalformedReply {
        method: &'static str,
        reason: String,
    },
    /// The idle-inhibiting helper process could not be launched.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[cfg(target_os = "linux")]
    #[error("session bus call failed: {0}")]
    Bus(#[from] zbus::Error),
}

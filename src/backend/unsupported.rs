use super::{Backend, Identity};
use crate::InhibitError;

/// Stand-in for targets without a known sleep inhibition API. Every request fails.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl UnsupportedBackend {
    pub fn new(_identity: Identity) -> Self {
        Self
    }
}

impl Backend for UnsupportedBackend {
    type Grant = ();

    const PLATFORM_NAME: &'static str = "Unknown";

    fn acquire(&mut self) -> Result<(), InhibitError> {
        Err(InhibitError::Acquire(
            "no sleep inhibition API is known for this platform".into(),
        ))
    }

    fn release(&mut self, _grant: &()) -> Result<(), InhibitError> {
        Ok(())
    }
}

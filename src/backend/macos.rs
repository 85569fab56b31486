use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};

use super::{Backend, Identity};
use crate::InhibitError;

type IOReturn = i32;
type IOPMAssertionID = u32;
type IOPMAssertionLevel = u32;

const K_IO_RETURN_SUCCESS: IOReturn = 0;
const K_IOPM_ASSERTION_LEVEL_ON: IOPMAssertionLevel = 255;
const K_IOPM_ASSERTION_TYPE_NO_DISPLAY_SLEEP: &str = "NoDisplaySleepAssertion";

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOPMAssertionCreateWithName(
        assertion_type: CFStringRef,
        level: IOPMAssertionLevel,
        name: CFStringRef,
        assertion_id: *mut IOPMAssertionID,
    ) -> IOReturn;
    fn IOPMAssertionRelease(assertion_id: IOPMAssertionID) -> IOReturn;
}

/// Holds a "no display sleep" power management assertion.
#[derive(Debug)]
pub struct PowerAssertionBackend {
    name: String,
}

impl PowerAssertionBackend {
    pub fn new(identity: Identity) -> Self {
        Self {
            name: format!("{}: {}", identity.app_name, identity.reason),
        }
    }
}

impl Backend for PowerAssertionBackend {
    type Grant = IOPMAssertionID;

    const PLATFORM_NAME: &'static str = "macOS";

    fn acquire(&mut self) -> Result<IOPMAssertionID, InhibitError> {
        let assertion_type = CFString::new(K_IOPM_ASSERTION_TYPE_NO_DISPLAY_SLEEP);
        let name = CFString::new(&self.name);
        let mut id: IOPMAssertionID = 0;
        // SAFETY: both CFStrings outlive the call and `id` is a valid out pointer
        let ret = unsafe {
            IOPMAssertionCreateWithName(
                assertion_type.as_concrete_TypeRef(),
                K_IOPM_ASSERTION_LEVEL_ON,
                name.as_concrete_TypeRef(),
                &mut id,
            )
        };
        if ret != K_IO_RETURN_SUCCESS {
            return Err(InhibitError::Acquire(format!(
                "IOPMAssertionCreateWithName returned {ret:#x}"
            )));
        }
        Ok(id)
    }

    fn release(&mut self, id: &IOPMAssertionID) -> Result<(), InhibitError> {
        // SAFETY: `id` came from a successful IOPMAssertionCreateWithName
        let ret = unsafe { IOPMAssertionRelease(*id) };
        if ret != K_IO_RETURN_SUCCESS {
            return Err(InhibitError::Release(format!(
                "IOPMAssertionRelease({id}) returned {ret:#x}"
            )));
        }
        Ok(())
    }
}

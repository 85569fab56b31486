use log::debug;
use windows_sys::Win32::System::Power::{
    SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED, ES_SYSTEM_REQUIRED,
    EXECUTION_STATE,
};

use super::{Backend, Identity};
use crate::InhibitError;

/// Keeps the system and display required through the thread execution state.
///
/// The flag belongs to the calling thread, so enable and disable must happen on
/// the same thread. Windows clears it when the thread exits.
#[derive(Debug, Default)]
pub struct ExecutionStateBackend;

impl ExecutionStateBackend {
    pub fn new(_identity: Identity) -> Self {
        Self
    }
}

impl Backend for ExecutionStateBackend {
    /// Execution state that was in place before ours.
    type Grant = EXECUTION_STATE;

    const PLATFORM_NAME: &'static str = "Windows";

    fn acquire(&mut self) -> Result<EXECUTION_STATE, InhibitError> {
        // SAFETY: plain FFI call with constant flags
        let previous = unsafe {
            SetThreadExecutionState(ES_CONTINUOUS | ES_SYSTEM_REQUIRED | ES_DISPLAY_REQUIRED)
        };
        if previous == 0 {
            return Err(InhibitError::Acquire(
                "SetThreadExecutionState returned 0".into(),
            ));
        }
        Ok(previous)
    }

    fn release(&mut self, previous: &EXECUTION_STATE) -> Result<(), InhibitError> {
        // SAFETY: plain FFI call with constant flags
        let ours = unsafe { SetThreadExecutionState(ES_CONTINUOUS) };
        if ours == 0 {
            // Idling was still reset as far as we can tell; nothing left to retry.
            debug!("SetThreadExecutionState returned 0 while resetting from {previous:#x}");
        }
        Ok(())
    }
}

//! Fault hooks wired to the platform's fatal error and assertion handlers.
//!
//! All of them end in fault containment, each category with its own blink
//! code, so the operator can tell a crash of the bootloader from a failed
//! recovery. A Rust panic counts as a failed assertion.

use std::panic::{self, AssertUnwindSafe};

use log::error;

use crate::containment;
use crate::error::FaultKind;
use crate::platform::{Button, Indicator, System};
use crate::settings::Settings;

/// Unrecoverable system fault reported by the kernel.
pub fn on_system_halt<P>(board: &mut P, settings: &Settings, reason: u32) -> !
where
    P: Button + Indicator + System,
{
    error!("System fatal error, reason {}", reason);
    board.mask_interrupts();
    containment::enter(board, settings, settings.fault_record(FaultKind::SystemHalt))
}

/// A runtime assertion failed at `file:line`.
pub fn on_assertion_failure<P>(board: &mut P, settings: &Settings, file: &str, line: u32) -> !
where
    P: Button + Indicator + System,
{
    error!("Assertion failed at {}:{}", file, line);
    board.mask_interrupts();
    containment::enter(board, settings, settings.fault_record(FaultKind::Assertion))
}

/// A panic escaped the code of the recovery stage.
pub fn on_panic<P>(board: &mut P, settings: &Settings, message: &str) -> !
where
    P: Button + Indicator + System,
{
    error!("Panic: {}", message);
    board.mask_interrupts();
    containment::enter(board, settings, settings.fault_record(FaultKind::Assertion))
}

/// Run `f` with `board`, turning any panic it raises into [`on_panic`].
pub fn contain_panics<P, F, T>(board: &mut P, settings: &Settings, f: F) -> T
where
    P: Button + Indicator + System,
    F: FnOnce(&mut P) -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(board))) {
        Ok(value) => value,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            on_panic(board, settings, &message)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

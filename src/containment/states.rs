//! States for the fault containment reset latch.
//!
//! This modules is private and restricted to the
//! [`containment`](crate::containment) scope.
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use log::info;

use super::events::*;
use crate::error::FaultRecord;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` on each button sample.
pub(crate) trait Runnable {
    /// Consume one button sample and request the next state by returning the
    /// matching `event`.
    fn run(&mut self, fault: &FaultRecord, asserted: bool) -> Event;
}

// Init State ==================================================================

/// The latch before its first sample. The first sample only decides whether
/// a release must be observed before a press counts.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, fault: &FaultRecord, asserted: bool) -> Event {
        if asserted {
            info!("Wait until button is released");
            Event::WaitForRelease(WaitForReleaseEvent { fault: *fault })
        } else {
            info!("Wait until button is pressed to reboot");
            Event::WaitForPress(WaitForPressEvent { fault: *fault })
        }
    }
}

// WaitForRelease State ========================================================

/// The button was held when containment started. A press only counts once it
/// has been released.
#[derive(Debug)]
pub(crate) struct WaitForReleaseState {}
impl Runnable for WaitForReleaseState {
    fn run(&mut self, fault: &FaultRecord, asserted: bool) -> Event {
        if asserted {
            Event::WaitForRelease(WaitForReleaseEvent { fault: *fault })
        } else {
            info!("Button is released");
            info!("Wait until button is pressed to reboot");
            Event::WaitForPress(WaitForPressEvent { fault: *fault })
        }
    }
}

// WaitForPress State ==========================================================

#[derive(Debug)]
pub(crate) struct WaitForPressState {}
impl Runnable for WaitForPressState {
    fn run(&mut self, fault: &FaultRecord, asserted: bool) -> Event {
        if asserted {
            info!("Button is pressed - reboot");
            Event::Reboot(RebootEvent { fault: *fault })
        } else {
            Event::WaitForPress(WaitForPressEvent { fault: *fault })
        }
    }
}

// Reboot State ================================================================

/// Terminal. The driver resets the device as soon as the latch gets here.
#[derive(Debug)]
pub(crate) struct RebootState {}
impl Runnable for RebootState {
    fn run(&mut self, fault: &FaultRecord, _asserted: bool) -> Event {
        Event::Reboot(RebootEvent { fault: *fault })
    }
}

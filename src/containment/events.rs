//! Events for the fault containment reset latch.
//!
//! This modules is private and restricted to the
//! [`containment`](crate::containment) scope. The public interface of the
//! latch is provided by [`containment`](crate::containment).
//!
//! ```ignore
//! use super::events::*;
//! ```
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use crate::error::FaultRecord;

// =============================================================================
// Crate-Public Interface
// =============================================================================

// WaitForReleaseEvent =========================================================

/// Event fired to trigger a transition to the `WaitForRelease` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the `Init` state, when the button is asserted at the moment
///     containment is entered (the operator may still be holding it from the
///     boot decision).
///  2. While at the `WaitForRelease` state, when the button is still held.
#[derive(Debug)]
pub(crate) struct WaitForReleaseEvent {
    pub fault: FaultRecord,
}

// WaitForPressEvent ===========================================================

/// Event fired to trigger a transition to the `WaitForPress` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the `Init` state, when the button is already released.
///  2. While at the `WaitForRelease` state, on the first released sample.
///  3. While at the `WaitForPress` state, as long as the button stays
///     released.
#[derive(Debug)]
pub(crate) struct WaitForPressEvent {
    pub fault: FaultRecord,
}

// RebootEvent =================================================================

/// Event fired when the button is pressed after having been seen released.
/// It triggers the transition to the terminal `Reboot` state.
#[derive(Debug)]
pub(crate) struct RebootEvent {
    pub fault: FaultRecord,
}

// Events enum =================================================================

/// Events that can be triggered within the reset latch.
#[derive(Debug)]
pub(crate) enum Event {
    WaitForRelease(WaitForReleaseEvent),
    WaitForPress(WaitForPressEvent),
    Reboot(RebootEvent),
}

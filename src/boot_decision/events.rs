//! Events for the boot decision state machine.
//!
//! This modules is private and restricted to the
//! [`boot_decision`](crate::boot_decision) scope. The public interface of the
//! state machine is provided by [`boot_decision`](crate::boot_decision).
//!
//! ```ignore
//! use super::events::*;
//! ```
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use crate::settings::Settings;

use super::BootDecision;

// =============================================================================
// Crate-Public Interface
// =============================================================================

// HoldEvent ===================================================================

/// Event fired to trigger a transition to the `Holding` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the `Sampling` state, when the very first sample finds the
///     button asserted. The timestamp of that sample starts the hold.
///  2. While at the `Holding` state, when the button is still asserted and
///     the hold threshold has not elapsed yet.
#[derive(Debug)]
pub(crate) struct HoldEvent {
    pub settings: Settings,
    /// Clock value of the sample that started the hold.
    pub since_ms: u32,
}

// DecidedEvent ================================================================

/// Event fired when the boot decision is known. It triggers the transition to
/// the terminal `Decided` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the `Sampling` state, when the button is not asserted
///     ([`BootDecision::Normal`]).
///  2. While at the `Holding` state, when the button is released before the
///     threshold ([`BootDecision::LoaderMode`]) or still held when it elapses
///     ([`BootDecision::FactoryRecovery`]).
#[derive(Debug)]
pub(crate) struct DecidedEvent {
    pub settings: Settings,
    pub decision: BootDecision,
}

// Events enum =================================================================

/// Events that can be triggered within the boot decision state machine.
#[derive(Debug)]
pub(crate) enum Event {
    Hold(HoldEvent),
    Decided(DecidedEvent),
}

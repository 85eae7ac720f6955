//! States for the boot decision state machine.
//!
//! This modules is private and restricted to the
//! [`boot_decision`](crate::boot_decision) scope. The public interface of the
//! state machine is provided by [`boot_decision`](crate::boot_decision).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use log::{debug, info};

use super::events::*;
use super::{BootDecision, Sample};
use crate::platform::elapsed_ms;
use crate::settings::Settings;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` on each button sample.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` with the next sample
    /// after the state machine transitions into it.
    ///
    /// The state requests a transition to a `new state` by returning the
    /// appropriate `event`, which is consumed to create the `new state` using
    /// the corresponding [`From`] trait implementation.
    fn run(&mut self, settings: &Settings, sample: Sample) -> Event;
}

// Sampling State ==============================================================

/// The initial state: the first sample of the button after reset.
///
///  * **[`HoldEvent`] => [`HoldingState`]** when the button is asserted,
///  * **[`DecidedEvent`] => [`DecidedState`]** with [`BootDecision::Normal`]
///    otherwise.
#[derive(Debug)]
pub(crate) struct SamplingState {}
impl Runnable for SamplingState {
    fn run(&mut self, settings: &Settings, sample: Sample) -> Event {
        if sample.asserted {
            info!(
                "Wait {} seconds to activate factory fw recovery (while button is pressed)",
                settings.recovery_hold_ms / 1000
            );
            Event::Hold(HoldEvent {
                settings: settings.clone(),
                since_ms: sample.now_ms,
            })
        } else {
            Event::Decided(DecidedEvent {
                settings: settings.clone(),
                decision: BootDecision::Normal,
            })
        }
    }
}

// Holding State ===============================================================

/// The button has been held since `since_ms`.
///
///  * **[`HoldEvent`] => [`HoldingState`]** while held and below the
///    threshold,
///  * **[`DecidedEvent`] => [`DecidedState`]** on release
///    ([`BootDecision::LoaderMode`]) or once the threshold has elapsed
///    ([`BootDecision::FactoryRecovery`]).
#[derive(Debug)]
pub(crate) struct HoldingState {
    pub since_ms: u32,
}
impl Runnable for HoldingState {
    fn run(&mut self, settings: &Settings, sample: Sample) -> Event {
        let held_ms = elapsed_ms(sample.now_ms, self.since_ms);

        if !sample.asserted {
            info!("Button released after {} ms", held_ms);
            return Event::Decided(DecidedEvent {
                settings: settings.clone(),
                decision: BootDecision::LoaderMode,
            });
        }
        if held_ms >= settings.recovery_hold_ms {
            return Event::Decided(DecidedEvent {
                settings: settings.clone(),
                decision: BootDecision::FactoryRecovery,
            });
        }
        Event::Hold(HoldEvent {
            settings: settings.clone(),
            since_ms: self.since_ms,
        })
    }
}

// Decided State ===============================================================

/// Terminal. Further samples are ignored.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DecidedState {
    pub decision: BootDecision,
}
impl Runnable for DecidedState {
    fn run(&mut self, settings: &Settings, _sample: Sample) -> Event {
        debug!("=> Decided {:?}", self.decision);
        Event::Decided(DecidedEvent {
            settings: settings.clone(),
            decision: self.decision,
        })
    }
}

//! Boot decision state machine.
//!
//! At reset, the button selects what the bootloader does next. A press held
//! for less than the threshold requests the firmware loader, a press held for
//! the whole threshold starts the factory firmware recovery, and no press at
//! all continues with the normal boot.
//!
//! The machine does not sample anything by itself: it is advanced with one
//! [`Sample`] at a time, which keeps it independent of the clock and of the
//! button driver.
//!
//! ```text
//!                 START
//!                   |
//!                   v
//!             .----------.
//!             | Sampling |
//!             '----------'
//!     released |        | asserted
//!              |        v
//!              |   .---------.  held, elapsed < threshold
//!              |   | Holding |-------.
//!              |   '---------'<------'
//!              |     |     |
//!              | released  elapsed >= threshold
//!              v     v     v
//!          Normal  Loader  FactoryRecovery
//!             '------+------'
//!                    |
//!              .-----------.
//!              |  Decided  |
//!              '-----------'
//! ```

use super::events::*;
use super::states::*;
use super::{BootDecision, Sample};
use crate::settings::Settings;

// =============================================================================
// Public Interface
// =============================================================================

/// Represents the boot decision state machine. Feed it samples with
/// [`poll`](BootDecisionMachine::poll) until it returns a decision.
#[derive(Debug)]
pub struct BootDecisionMachine {
    sm: DecisionStates,
}
impl BootDecisionMachine {
    pub fn new(settings: Settings) -> Self {
        BootDecisionMachine {
            // The machine naturally starts in the `Sampling` state.
            sm: DecisionStates::Sampling(DecisionSM::new(settings)),
        }
    }

    /// Advance the machine with one sample. Returns the decision once it is
    /// known, and keeps returning it for any later sample.
    pub fn poll(&mut self, sample: Sample) -> Option<BootDecision> {
        self.sm = self.sm.step(sample);
        match &self.sm {
            DecisionStates::Decided(sm) => Some(sm.state.decision),
            _ => None,
        }
    }

    /// `true` while a press is being timed.
    pub fn is_holding(&self) -> bool {
        matches!(self.sm, DecisionStates::Holding(_))
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine, holding the settings shared by all states and the
/// current state.
#[derive(Debug)]
struct DecisionSM<S: Runnable> {
    settings: Settings,
    state: S,
}
impl<S: Runnable> DecisionSM<S> {
    fn run(&mut self, sample: Sample) -> Event {
        self.state.run(&self.settings, sample)
    }
}

/// The state machine starts in the `SamplingState`.
impl DecisionSM<SamplingState> {
    fn new(settings: Settings) -> Self {
        DecisionSM {
            settings,
            state: SamplingState {},
        }
    }
}

/// An enum wrapper around the states of the boot decision state machine.
#[derive(Debug)]
enum DecisionStates {
    Sampling(DecisionSM<SamplingState>),
    Holding(DecisionSM<HoldingState>),
    Decided(DecisionSM<DecidedState>),
}
impl DecisionStates {
    /// The unit of work of the state machine: run the current state with the
    /// sample and transition according to the event it returns.
    fn step(&mut self, sample: Sample) -> Self {
        match self {
            DecisionStates::Sampling(sm) => {
                let event = sm.run(sample);
                match event {
                    Event::Hold(ev) => DecisionStates::Holding(ev.into()),
                    Event::Decided(ev) => DecisionStates::Decided(ev.into()),
                }
            }
            DecisionStates::Holding(sm) => {
                let event = sm.run(sample);
                match event {
                    Event::Hold(ev) => DecisionStates::Holding(ev.into()),
                    Event::Decided(ev) => DecisionStates::Decided(ev.into()),
                }
            }
            DecisionStates::Decided(sm) => {
                let event = sm.run(sample);
                match event {
                    Event::Decided(ev) => DecisionStates::Decided(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<HoldEvent> for DecisionSM<HoldingState> {
    fn from(event: HoldEvent) -> DecisionSM<HoldingState> {
        DecisionSM {
            settings: event.settings,
            state: HoldingState {
                since_ms: event.since_ms,
            },
        }
    }
}

impl From<DecidedEvent> for DecisionSM<DecidedState> {
    fn from(event: DecidedEvent) -> DecisionSM<DecidedState> {
        DecisionSM {
            settings: event.settings,
            state: DecidedState {
                decision: event.decision,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

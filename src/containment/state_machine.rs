//! Reset latch of the fault containment loop.
//!
//! While the fault code blinks, every button sample is fed to this latch. It
//! lets an operator reboot the device by pressing the button, but only after
//! the button has been seen released, so that the hold which may have led
//! here does not reboot the device by itself.
//!
//! ```text
//!                  START
//!                    |
//!                    v
//!               .---------.
//!               |  Init   |
//!               '---------'
//!        held   |         |  released
//!               v         v
//!  .----------------.   .--------------.
//!  | WaitForRelease |-->| WaitForPress |
//!  '----------------'   '--------------'
//!      ^      | held     ^     |    |
//!      '------'          '-----'    | pressed
//!                      released     v
//!                               .--------.
//!                               | Reboot |
//!                               '--------'
//! ```

use super::events::*;
use super::states::*;
use crate::error::FaultRecord;

// =============================================================================
// Public Interface
// =============================================================================

/// Tracks the release-then-press gesture that leaves fault containment.
#[derive(Debug)]
pub struct ResetLatch {
    sm: LatchStates,
}
impl ResetLatch {
    pub fn new(fault: FaultRecord) -> Self {
        ResetLatch {
            sm: LatchStates::Init(LatchSM::new(fault)),
        }
    }

    /// Feed one button sample. Returns `true` once the device must reboot.
    pub fn sample(&mut self, asserted: bool) -> bool {
        self.sm = self.sm.step(asserted);
        matches!(self.sm, LatchStates::Reboot(_))
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw latch state machine. The fault record is the data shared by all
/// states.
#[derive(Debug)]
struct LatchSM<S: Runnable> {
    fault: FaultRecord,
    state: S,
}
impl<S: Runnable> LatchSM<S> {
    fn run(&mut self, asserted: bool) -> Event {
        self.state.run(&self.fault, asserted)
    }
}

/// The latch starts in the `InitState`.
impl LatchSM<InitState> {
    fn new(fault: FaultRecord) -> Self {
        LatchSM {
            fault,
            state: InitState {},
        }
    }
}

#[derive(Debug)]
enum LatchStates {
    Init(LatchSM<InitState>),
    WaitForRelease(LatchSM<WaitForReleaseState>),
    WaitForPress(LatchSM<WaitForPressState>),
    Reboot(LatchSM<RebootState>),
}
impl LatchStates {
    fn step(&mut self, asserted: bool) -> Self {
        match self {
            LatchStates::Init(sm) => {
                let event = sm.run(asserted);
                match event {
                    Event::WaitForRelease(ev) => LatchStates::WaitForRelease(ev.into()),
                    Event::WaitForPress(ev) => LatchStates::WaitForPress(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            LatchStates::WaitForRelease(sm) => {
                let event = sm.run(asserted);
                match event {
                    Event::WaitForRelease(ev) => LatchStates::WaitForRelease(ev.into()),
                    Event::WaitForPress(ev) => LatchStates::WaitForPress(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            LatchStates::WaitForPress(sm) => {
                let event = sm.run(asserted);
                match event {
                    Event::WaitForPress(ev) => LatchStates::WaitForPress(ev.into()),
                    Event::Reboot(ev) => LatchStates::Reboot(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            LatchStates::Reboot(sm) => {
                let event = sm.run(asserted);
                match event {
                    Event::Reboot(ev) => LatchStates::Reboot(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<WaitForReleaseEvent> for LatchSM<WaitForReleaseState> {
    fn from(event: WaitForReleaseEvent) -> LatchSM<WaitForReleaseState> {
        LatchSM {
            fault: event.fault,
            state: WaitForReleaseState {},
        }
    }
}

impl From<WaitForPressEvent> for LatchSM<WaitForPressState> {
    fn from(event: WaitForPressEvent) -> LatchSM<WaitForPressState> {
        LatchSM {
            fault: event.fault,
            state: WaitForPressState {},
        }
    }
}

impl From<RebootEvent> for LatchSM<RebootState> {
    fn from(event: RebootEvent) -> LatchSM<RebootState> {
        LatchSM {
            fault: event.fault,
            state: RebootState {},
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

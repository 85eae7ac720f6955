//! Boot decision: what the operator asks for by holding the button at reset.
//!
//! A press is timed from the very first sample. Releasing it before
//! [`Settings::recovery_hold_ms`] requests the firmware loader, holding it for
//! the whole threshold starts the factory firmware recovery. Both LEDs stay on
//! while the press is timed.
//!
//! **Example** - Deciding on a board:
//! ```ignore
//! match boot_decision::decide(&mut board, &settings) {
//!     BootDecision::FactoryRecovery => recovery::run(&mut board, &settings, RecoveryPlan::factory()),
//!     BootDecision::LoaderMode => { /* ... */ }
//!     BootDecision::Normal => { /* ... */ }
//! }
//! ```

mod events;
mod state_machine;
mod states;

use log::info;

use crate::platform::{Button, Indicator, System};
use crate::settings::Settings;

pub use state_machine::BootDecisionMachine;

/// Outcome of the button sampling window. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDecision {
    Normal,
    LoaderMode,
    FactoryRecovery,
}

/// One button sample, stamped with the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub asserted: bool,
    pub now_ms: u32,
}

/// Sample the button until the decision is known.
///
/// The first sample is taken right away, then one every
/// [`Settings::decision_poll_ms`] while the press is timed.
pub fn decide<P>(board: &mut P, settings: &Settings) -> BootDecision
where
    P: Button + Indicator + System,
{
    let mut machine = BootDecisionMachine::new(settings.clone());
    let mut lit = false;

    loop {
        let sample = Sample {
            asserted: board.is_asserted(),
            now_ms: board.now_ms(),
        };
        if let Some(decision) = machine.poll(sample) {
            if lit {
                board.set_both(false);
            }
            info!("Boot decision: {:?}", decision);
            return decision;
        }
        if !lit && machine.is_holding() {
            board.set_both(true);
            lit = true;
        }
        board.sleep_ms(settings.decision_poll_ms);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockBoard};
    use crate::platform::Channel;

    #[test]
    fn never_pressed_is_normal() {
        let mut board = MockBoard::new();
        assert_eq!(decide(&mut board, &Settings::default()), BootDecision::Normal);
        assert_eq!(board.samples(), 1);
        assert_eq!(board.count(|c| matches!(c, Call::Led(..))), 0);
    }

    #[test]
    fn released_after_three_seconds_is_loader_mode() {
        let mut board = MockBoard::new().with_button_held_until(3_000);
        assert_eq!(
            decide(&mut board, &Settings::default()),
            BootDecision::LoaderMode
        );
        assert_eq!(board.now(), 3_000);
        assert_eq!(
            board.calls().last(),
            Some(&Call::Led(Channel::Green, false))
        );
    }

    #[test]
    fn held_past_threshold_is_factory_recovery() {
        let mut board = MockBoard::new().with_button_held_until(60_000);
        assert_eq!(
            decide(&mut board, &Settings::default()),
            BootDecision::FactoryRecovery
        );
        assert_eq!(board.now(), 10_000);
        assert_eq!(board.count(|c| *c == Call::Led(Channel::Red, true)), 1);
        assert_eq!(board.count(|c| *c == Call::Led(Channel::Red, false)), 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let settings = Settings::default();
        let mut board = MockBoard::new().with_button_held_until(10_001);
        assert_eq!(decide(&mut board, &settings), BootDecision::FactoryRecovery);
    }

    #[test]
    fn leds_on_while_holding() {
        let mut board = MockBoard::new().with_button_held_until(50);
        decide(&mut board, &Settings::default());
        let calls = board.calls();
        assert_eq!(calls[0], Call::Led(Channel::Red, true));
        assert_eq!(calls[1], Call::Led(Channel::Green, true));
        assert_eq!(calls[2], Call::Sleep(10));
    }

    #[test]
    fn hold_across_clock_wrap() {
        let settings = Settings::default();
        let start = u32::MAX - 4_000;
        let mut board = MockBoard::new()
            .with_clock(start, 0)
            .with_button(&[true]);
        assert_eq!(decide(&mut board, &settings), BootDecision::FactoryRecovery);
        assert_eq!(board.now(), start.wrapping_add(10_000));
    }
}

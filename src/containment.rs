//! Fault containment: the terminal state of the bootloader.
//!
//! Entered on any failure of the factory firmware recovery and from the
//! platform fault hooks. It never returns: the red LED blinks the fault code
//! forever, and the only way out is a cold reset triggered by the operator
//! releasing then pressing the button (or a power cycle).
//!
//! **Example** - Entering containment after a failed step:
//! ```ignore
//! let fault = settings.fault_record(FaultKind::RecoveryFailed);
//! containment::enter(&mut board, &settings, fault);
//! ```

mod blink;
mod events;
mod state_machine;
mod states;

use log::error;

use crate::error::FaultRecord;
use crate::platform::{Button, Channel, Indicator, System};
use crate::settings::Settings;

pub use blink::{BlinkSchedule, Tick};
pub use state_machine::ResetLatch;

/// Blink `fault` on the red LED until the operator asks for a reboot.
///
/// Interrupts are masked first so that no other fault can re-enter
/// concurrently.
pub fn enter<P>(board: &mut P, settings: &Settings, fault: FaultRecord) -> !
where
    P: Button + Indicator + System,
{
    board.mask_interrupts();
    error!(
        "Fault containment: {:?}, blinking {} times",
        fault.kind, fault.blinks
    );

    let mut latch = ResetLatch::new(fault);
    latch.sample(board.is_asserted());
    board.set(Channel::Green, false);

    let mut schedule = BlinkSchedule::new(settings, fault.blinks);
    loop {
        let tick = schedule.next_tick();
        if let Some(on) = tick.red {
            board.set(Channel::Red, on);
        }
        board.sleep_ms(tick.sleep_ms);
        if latch.sample(board.is_asserted()) {
            board.sleep_ms(settings.fault_reboot_delay_ms);
            board.reset();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

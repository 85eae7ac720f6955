//! Entry point of the recovery stage, called once at every reset.
//!
//! The boot decision runs first. A factory recovery never comes back here: it
//! ends with a reset or in fault containment. The two other outcomes return to
//! the caller, which continues the normal boot.

use log::{error, info};

use crate::boot_decision::{decide, BootDecision};
use crate::platform::{BootMode, Platform};
use crate::recovery::{self, RecoveryPlan};
use crate::settings::Settings;

/// Decide what to do from the button and do it.
///
/// Returns the decision when the boot continues, that is for
/// [`BootDecision::Normal`] and [`BootDecision::LoaderMode`].
pub fn run_boot_stage<P: Platform>(board: &mut P, settings: &Settings) -> BootDecision {
    let decision = decide(board, settings);
    match decision {
        BootDecision::FactoryRecovery => recovery::run(board, settings, RecoveryPlan::factory()),
        BootDecision::LoaderMode => {
            // The loader is only a convenience: booting the current firmware
            // is still fine if the register cannot be written.
            match board.set_boot_mode(BootMode::Loader) {
                Ok(()) => info!("Boot mode set to {}", BootMode::Loader),
                Err(rc) => error!("Failed to set boot mode {}, {}", BootMode::Loader, rc),
            }
        }
        BootDecision::Normal => {}
    }
    decision
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{expect_reset, Call, MockBoard};
    use crate::recovery::FACTORY_JOBS;

    #[test]
    fn normal_boot_touches_nothing() {
        let mut board = MockBoard::new().with_factory_layout(1024);
        assert_eq!(
            run_boot_stage(&mut board, &Settings::default()),
            BootDecision::Normal
        );
        assert!(board.calls().is_empty());
        assert_eq!(board.boot_mode(), None);
    }

    #[test]
    fn short_press_selects_loader() {
        let mut board = MockBoard::new().with_button_held_until(3_000);
        assert_eq!(
            run_boot_stage(&mut board, &Settings::default()),
            BootDecision::LoaderMode
        );
        assert_eq!(board.boot_mode(), Some(BootMode::Loader));
    }

    #[test]
    fn loader_register_failure_still_boots() {
        let mut board = MockBoard::new()
            .with_button_held_until(3_000)
            .failing_boot_mode();
        assert_eq!(
            run_boot_stage(&mut board, &Settings::default()),
            BootDecision::LoaderMode
        );
        assert_eq!(board.count(|c| *c == Call::BootMode(BootMode::Loader)), 1);
        assert_eq!(board.boot_mode(), None);
        assert_eq!(board.count(|c| *c == Call::MaskInterrupts), 0);
    }

    #[test]
    fn long_press_restores_factory_firmware_and_reboots() {
        let settings = Settings::default();
        // Released right after the decision.
        let mut board = MockBoard::new()
            .with_factory_layout(4096)
            .with_button_held_until(10_000 + 5);

        expect_reset(&mut board, |board| {
            run_boot_stage(board, &settings);
        });

        for job in FACTORY_JOBS.iter() {
            assert_eq!(board.region(job.dst), board.region(job.src));
        }
        assert_eq!(board.boot_mode(), Some(BootMode::FactoryReset));
        assert_eq!(board.count(|c| *c == Call::Reset), 1);
        assert_eq!(board.count(|c| *c == Call::MaskInterrupts), 0);
    }

    #[test]
    fn held_through_recovery_waits_for_release() {
        let settings = Settings::default();
        let mut board = MockBoard::new()
            .with_factory_layout(1024)
            .with_button_held_until(10_100);

        expect_reset(&mut board, |board| {
            run_boot_stage(board, &settings);
        });

        // The recovery itself does not sleep: the release wait starts at
        // 10 000 ms and polls until 10 100 ms.
        assert_eq!(
            board.count(|c| *c == Call::Sleep(settings.release_poll_ms)),
            1_000 + 10
        );
        assert_eq!(board.boot_mode(), Some(BootMode::FactoryReset));
    }
}

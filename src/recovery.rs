//! Factory firmware recovery planner.
//!
//! Restores every internal partition from its backup in external flash, wipes
//! the user data and tells the next boot stage to finish the factory reset.
//! Nothing is written before every backup image has been checked, and every
//! step only runs if all the previous ones succeeded.
//!
//! [`execute`] performs the steps and returns the first failure.
//! [`run`] is the driver used by the boot stage: it signals progress on the
//! LEDs and ends either with a reset or in fault containment.

mod plan;

use log::{error, info};

use crate::containment;
use crate::error::{Error, FaultKind, Result};
use crate::image;
use crate::platform::{BootModeRegister, Button, Indicator, PatternKind, Platform, RegionIo, System};
use crate::region::erase_region;
use crate::settings::Settings;
use crate::transfer::{copy_with, first_mismatch, Scratch};

pub use plan::{RecoveryPlan, TransferJob, FACTORY_JOBS};

// =============================================================================
// Public Interface
// =============================================================================

/// Carry out `plan`: validate, then copy and verify every job, then erase the
/// cleanup region, then commit.
pub fn execute<P>(io: &mut P, plan: &RecoveryPlan) -> Result<()>
where
    P: RegionIo + BootModeRegister,
{
    for role in plan.images() {
        image::validate(io, role)?;
    }

    let mut scratch = Scratch::new();
    for job in plan.jobs {
        copy_with(io, job.dst, job.src, job.erase_dst, &mut scratch)?;
        if let Some(offset) = first_mismatch(io, job.dst, job.src, &mut scratch)? {
            error!("Image {} differs from {} after copy", job.dst, job.src);
            return Err(Error::VerifyMismatch {
                dst: job.dst,
                src: job.src,
                offset,
            });
        }
        info!("Image {} restored from {}", job.dst, job.src);
    }

    erase_region(io, plan.cleanup)?;

    io.set_boot_mode(plan.commit).map_err(|rc| {
        error!("Failed to set boot mode {}, {}", plan.commit, rc);
        Error::CommitFault(rc)
    })?;
    info!("Boot mode set to {}", plan.commit);
    Ok(())
}

/// Run the recovery with the progress pattern on, then reboot.
///
/// Any failure stops the pattern and enters fault containment with
/// [`FaultKind::RecoveryFailed`].
pub fn run<P: Platform>(board: &mut P, settings: &Settings, plan: RecoveryPlan) -> ! {
    info!("Factory fw recovery started");
    board.start_pattern(PatternKind::RecoveryInProgress);

    if let Err(err) = execute(board, &plan) {
        error!("Factory fw recovery failed: {}", err);
        board.stop_pattern();
        containment::enter(
            board,
            settings,
            settings.fault_record(FaultKind::RecoveryFailed),
        );
    }

    board.stop_pattern();
    info!("Factory fw recovery completed successfully");
    reboot_after_release(board, settings)
}

// =============================================================================
// Private stuff
// =============================================================================

/// The operator may still be holding the button from the boot decision.
/// Reboot only once it is released, with both LEDs on meanwhile.
fn reboot_after_release<P>(board: &mut P, settings: &Settings) -> !
where
    P: Button + Indicator + System,
{
    if board.is_asserted() {
        info!("Release the button to reboot");
        board.set_both(true);
        while board.is_asserted() {
            board.sleep_ms(settings.release_poll_ms);
        }
        board.set_both(false);
    }
    info!("Reboot");
    board.sleep_ms(settings.recovery_reboot_delay_ms);
    board.reset()
}

// =============================================================================
// Unit Tests
// =============================================================================

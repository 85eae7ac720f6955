//! The ordered list of transfers making up a factory firmware recovery.

use crate::platform::BootMode;
use crate::region::RegionRole;

/// One directed copy-and-verify unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferJob {
    pub src: RegionRole,
    pub dst: RegionRole,
    /// Erase the destination before writing.
    pub erase_dst: bool,
    /// The source holds a firmware image whose descriptor must be valid
    /// before anything is written. Provisioning data carries no descriptor.
    pub holds_image: bool,
}

/// Transfers from the external flash backups, in the order they are
/// restored: provisioning data, the two firmware slots, then the two
/// bootloader update slots.
pub const FACTORY_JOBS: [TransferJob; 5] = [
    TransferJob {
        src: RegionRole::ProvisionExt,
        dst: RegionRole::Provision,
        erase_dst: true,
        holds_image: false,
    },
    TransferJob {
        src: RegionRole::S0Ext,
        dst: RegionRole::S0,
        erase_dst: true,
        holds_image: true,
    },
    TransferJob {
        src: RegionRole::S1Ext,
        dst: RegionRole::S1,
        erase_dst: true,
        holds_image: true,
    },
    TransferJob {
        src: RegionRole::McubootPrimaryExt,
        dst: RegionRole::McubootPrimary,
        erase_dst: true,
        holds_image: true,
    },
    TransferJob {
        src: RegionRole::McubootSecondaryExt,
        dst: RegionRole::McubootSecondary,
        erase_dst: true,
        holds_image: true,
    },
];

/// Transfers, then the cleanup erase, then the commit to the boot-mode
/// register. Each step only runs if every previous one succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPlan<'a> {
    pub jobs: &'a [TransferJob],
    /// Region erased once every job is done.
    pub cleanup: RegionRole,
    /// Value committed to the boot-mode register at the very end.
    pub commit: BootMode,
}
impl RecoveryPlan<'static> {
    /// The plan shipped with the bootloader.
    pub fn factory() -> Self {
        RecoveryPlan {
            jobs: &FACTORY_JOBS,
            cleanup: RegionRole::ExtFlashUserspace,
            commit: BootMode::FactoryReset,
        }
    }
}
impl<'a> RecoveryPlan<'a> {
    /// Source regions whose image descriptor is checked before the first
    /// write, in plan order.
    pub fn images(&self) -> impl Iterator<Item = RegionRole> + 'a {
        self.jobs.iter().filter(|job| job.holds_image).map(|job| job.src)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

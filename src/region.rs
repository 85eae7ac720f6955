//! Storage regions known to the recovery engine.
//!
//! Regions are identified by their role in the partition layout. Each
//! internal-flash partition has a backup twin of the same size in external
//! flash (the `*_ext` roles), which holds the factory firmware.

use std::{fmt, str::FromStr};

use log::error;

use crate::error::{Error, IoOp, Result};
use crate::platform::RegionIo;

// =============================================================================
// Public Interface
// =============================================================================

/// Role tag of a storage region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionRole {
    Provision,
    ProvisionExt,
    S0,
    S0Ext,
    S1,
    S1Ext,
    McubootPrimary,
    McubootPrimaryExt,
    McubootSecondary,
    McubootSecondaryExt,
    ExtFlashUserspace,
}
impl RegionRole {
    pub const ALL: [RegionRole; 11] = [
        RegionRole::Provision,
        RegionRole::ProvisionExt,
        RegionRole::S0,
        RegionRole::S0Ext,
        RegionRole::S1,
        RegionRole::S1Ext,
        RegionRole::McubootPrimary,
        RegionRole::McubootPrimaryExt,
        RegionRole::McubootSecondary,
        RegionRole::McubootSecondaryExt,
        RegionRole::ExtFlashUserspace,
    ];

    /// Partition name, as used in the partition layout.
    pub fn name(self) -> &'static str {
        match self {
            RegionRole::Provision => "provision",
            RegionRole::ProvisionExt => "provision_ext",
            RegionRole::S0 => "s0",
            RegionRole::S0Ext => "s0_ext",
            RegionRole::S1 => "s1",
            RegionRole::S1Ext => "s1_ext",
            RegionRole::McubootPrimary => "mcuboot_primary",
            RegionRole::McubootPrimaryExt => "mcuboot_primary_ext",
            RegionRole::McubootSecondary => "mcuboot_secondary",
            RegionRole::McubootSecondaryExt => "mcuboot_secondary_ext",
            RegionRole::ExtFlashUserspace => "ext_flash_userspace",
        }
    }

    /// `true` for regions living in the external flash device.
    pub fn is_external(self) -> bool {
        matches!(
            self,
            RegionRole::ProvisionExt
                | RegionRole::S0Ext
                | RegionRole::S1Ext
                | RegionRole::McubootPrimaryExt
                | RegionRole::McubootSecondaryExt
                | RegionRole::ExtFlashUserspace
        )
    }
}
impl fmt::Display for RegionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for RegionRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RegionRole::ALL
            .iter()
            .copied()
            .find(|role| role.name() == s)
            .ok_or_else(|| format!("unknown region `{}`", s))
    }
}

/// Attributes of an open region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub role: RegionRole,
    /// Name of the flash device backing the region.
    pub device_id: &'static str,
    /// Absolute address of the region on its device.
    pub base_offset: usize,
    pub size: usize,
}

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Open `role`, run `f` with the handle and close the region before
/// returning, whatever `f` returned.
pub(crate) fn with_region<P, T, F>(io: &mut P, role: RegionRole, f: F) -> Result<T>
where
    P: RegionIo,
    F: FnOnce(&mut P, &P::Handle) -> Result<T>,
{
    let handle = io.open(role).map_err(|source| {
        error!("Failed to open flash area {}, {}", role, source);
        Error::IoFault {
            role,
            op: IoOp::Open,
            offset: 0,
            source,
        }
    })?;
    let result = f(io, &handle);
    io.close(handle);
    result
}

/// Erase the whole extent of `role`.
pub(crate) fn erase_region<P: RegionIo>(io: &mut P, role: RegionRole) -> Result<()> {
    with_region(io, role, |io, handle| {
        let info = io.info(handle);
        log::info!(
            "Erase flash area {} at {:#010x} ({}), size {} bytes",
            role,
            info.base_offset,
            info.device_id,
            info.size
        );
        io.erase(handle, 0, info.size).map_err(|source| {
            error!(
                "Failed to erase flash area {} (address {:#010x}, size {:#010x}), {}",
                role, info.base_offset, info.size, source
            );
            Error::IoFault {
                role,
                op: IoOp::Erase,
                offset: 0,
                source,
            }
        })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockBoard};
    use crate::platform::DriverError;

    #[test]
    fn names_round_trip_through_from_str() {
        for role in RegionRole::ALL.iter() {
            assert_eq!(role.name().parse::<RegionRole>().unwrap(), *role);
        }
        assert!("s2".parse::<RegionRole>().is_err());
    }

    #[test]
    fn backups_are_external() {
        assert!(RegionRole::S0Ext.is_external());
        assert!(!RegionRole::S0.is_external());
        assert!(RegionRole::ExtFlashUserspace.is_external());
    }

    #[test]
    fn region_is_closed_when_closure_fails() {
        let mut board = MockBoard::new().with_region(RegionRole::S0, vec![0; 16]);
        let result: Result<()> = with_region(&mut board, RegionRole::S0, |_, _| {
            Err(Error::InvalidImage(RegionRole::S0))
        });
        assert_eq!(result, Err(Error::InvalidImage(RegionRole::S0)));
        assert_eq!(board.open_handles(), 0);
    }

    #[test]
    fn open_failure_is_an_io_fault() {
        let mut board = MockBoard::new();
        let result = erase_region(&mut board, RegionRole::ExtFlashUserspace);
        assert!(matches!(
            result,
            Err(Error::IoFault {
                role: RegionRole::ExtFlashUserspace,
                op: IoOp::Open,
                source: DriverError(_),
                ..
            })
        ));
    }

    #[test]
    fn erase_covers_whole_region() {
        let mut board = MockBoard::new().with_region(RegionRole::ExtFlashUserspace, vec![0; 600]);
        erase_region(&mut board, RegionRole::ExtFlashUserspace).unwrap();
        assert!(board
            .calls()
            .contains(&Call::Erase(RegionRole::ExtFlashUserspace, 0, 600)));
        assert!(board
            .region(RegionRole::ExtFlashUserspace)
            .iter()
            .all(|b| *b == 0xFF));
    }
}

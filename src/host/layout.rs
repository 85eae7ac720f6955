//! Partition layout of the simulated board.
//!
//! The sizes are much smaller than on a real device so that a full recovery
//! runs in a blink, but the roles and their pairing are the real ones.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::info;

use super::flash::BOOT_MODE_FILE;
use crate::image::FwInfo;
use crate::recovery::FACTORY_JOBS;
use crate::region::RegionRole;

/// One region of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub role: RegionRole,
    /// Absolute address on its flash device.
    pub base_offset: usize,
    pub size: usize,
}

#[rustfmt::skip]
pub const DEFAULT_LAYOUT: [Partition; 11] = [
    // Internal flash
    Partition { role: RegionRole::Provision,           base_offset: 0x0000_7000, size: 0x1000 },
    Partition { role: RegionRole::S0,                  base_offset: 0x0000_8000, size: 0x8000 },
    Partition { role: RegionRole::S1,                  base_offset: 0x0001_0000, size: 0x8000 },
    Partition { role: RegionRole::McubootPrimary,      base_offset: 0x0001_8000, size: 0x1_0000 },
    Partition { role: RegionRole::McubootSecondary,    base_offset: 0x0002_8000, size: 0x1_0000 },
    // External flash
    Partition { role: RegionRole::ProvisionExt,        base_offset: 0x0000_0000, size: 0x1000 },
    Partition { role: RegionRole::S0Ext,               base_offset: 0x0000_1000, size: 0x8000 },
    Partition { role: RegionRole::S1Ext,               base_offset: 0x0000_9000, size: 0x8000 },
    Partition { role: RegionRole::McubootPrimaryExt,   base_offset: 0x0001_1000, size: 0x1_0000 },
    Partition { role: RegionRole::McubootSecondaryExt, base_offset: 0x0002_1000, size: 0x1_0000 },
    Partition { role: RegionRole::ExtFlashUserspace,   base_offset: 0x0003_1000, size: 0x4000 },
];

/// Base addresses of the default layout, for log messages.
pub fn base_offsets() -> Vec<(RegionRole, usize)> {
    DEFAULT_LAYOUT
        .iter()
        .map(|p| (p.role, p.base_offset))
        .collect()
}

/// Files of the layout already present in `dir`.
pub fn existing_files(dir: &Path) -> Vec<PathBuf> {
    DEFAULT_LAYOUT
        .iter()
        .map(|p| dir.join(format!("{}.bin", p.role)))
        .chain(std::iter::once(dir.join(BOOT_MODE_FILE)))
        .filter(|path| path.exists())
        .collect()
}

/// Create the region files of the default layout in `dir`.
///
/// The backups in external flash hold factory images with a valid descriptor,
/// the internal partitions hold garbage and the user data region is filled.
/// The boot-mode register starts blank.
pub fn init_layout(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    for partition in DEFAULT_LAYOUT.iter() {
        let content = initial_content(partition);
        fs::write(dir.join(format!("{}.bin", partition.role)), content)?;
        info!(
            "{:<22} {:#010x} {:>6} bytes",
            partition.role.name(),
            partition.base_offset,
            partition.size
        );
    }

    match fs::remove_file(dir.join(BOOT_MODE_FILE)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Flip the first byte of `role`, which breaks the magic of a descriptor at
/// offset `0`.
pub fn corrupt_descriptor(dir: &Path, role: RegionRole) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(dir.join(format!("{}.bin", role)))?;
    let mut first = [0u8; 1];
    file.read_exact(&mut first)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&[!first[0]])?;
    file.sync_all()
}

// =============================================================================
// Private stuff
// =============================================================================

fn initial_content(partition: &Partition) -> Vec<u8> {
    let role = partition.role;
    let size = partition.size;

    if role == RegionRole::ExtFlashUserspace {
        return vec![0x5A; size];
    }
    if !role.is_external() {
        return vec![0x00; size];
    }

    let seed = partition.base_offset / 0x1000;
    let mut content: Vec<u8> = (0..size).map(|i| (i / 3 + seed) as u8).collect();
    let job = FACTORY_JOBS.iter().find(|job| job.src == role);
    if let Some(job) = job.filter(|job| job.holds_image) {
        let load_address = DEFAULT_LAYOUT
            .iter()
            .find(|p| p.role == job.dst)
            .map(|p| p.base_offset)
            .unwrap_or(0);
        let fw_info = FwInfo::new(size as u32, 1, load_address as u32);
        content[..FwInfo::LEN].copy_from_slice(&fw_info.encode());
    }
    content
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Storage regions and boot-mode register backed by files.
//!
//! Each region is a file named `<role>.bin` in the flash directory, its size
//! is the size of the region. The boot-mode register is the single byte of
//! `bootmode.bin`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::platform::{BootMode, BootModeRegister, DriverError, RegionIo};
use crate::region::{RegionInfo, RegionRole};

/// File name of the boot-mode register.
pub const BOOT_MODE_FILE: &str = "bootmode.bin";

const EINVAL: i32 = -22;
const EIO: i32 = -5;

/// An open region file.
#[derive(Debug)]
pub struct FlashHandle {
    file: File,
    info: RegionInfo,
}

/// The flash devices of the simulated board, as a directory of region files.
#[derive(Debug, Clone)]
pub struct FileFlash {
    dir: PathBuf,
    base_offsets: Vec<(RegionRole, usize)>,
}
impl FileFlash {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileFlash {
            dir: dir.as_ref().to_path_buf(),
            base_offsets: Vec::new(),
        }
    }

    /// Absolute addresses used in log messages, as laid out by
    /// [`init_layout`](super::init_layout).
    pub fn with_base_offsets(mut self, offsets: Vec<(RegionRole, usize)>) -> Self {
        self.base_offsets = offsets;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn region_path(&self, role: RegionRole) -> PathBuf {
        self.dir.join(format!("{}.bin", role))
    }

    /// Current content of the boot-mode register, if it was ever written.
    pub fn boot_mode_value(&self) -> io::Result<Option<u8>> {
        let mut value = [0u8; 1];
        match File::open(self.dir.join(BOOT_MODE_FILE)) {
            Ok(mut file) => match file.read(&mut value)? {
                0 => Ok(None),
                _ => Ok(Some(value[0])),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn base_offset(&self, role: RegionRole) -> usize {
        self.base_offsets
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, offset)| *offset)
            .unwrap_or(0)
    }
}

impl RegionIo for FileFlash {
    type Handle = FlashHandle;

    fn open(&mut self, role: RegionRole) -> Result<FlashHandle, DriverError> {
        let path = self.region_path(role);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(to_driver_error)?;
        let size = file.metadata().map_err(to_driver_error)?.len() as usize;
        debug!("open {} ({} bytes)", path.display(), size);
        Ok(FlashHandle {
            file,
            info: RegionInfo {
                role,
                device_id: if role.is_external() { "ext-flash" } else { "int-flash" },
                base_offset: self.base_offset(role),
                size,
            },
        })
    }

    fn info(&self, handle: &FlashHandle) -> RegionInfo {
        handle.info
    }

    // `&File` implements `Read`, `Write` and `Seek`.
    fn read(
        &mut self,
        handle: &FlashHandle,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), DriverError> {
        trace!("read {} bytes at {:#x} in {}", buf.len(), offset, handle.info.role);
        let mut file = &handle.file;
        check_bounds(handle, offset, buf.len())?;
        file.seek(SeekFrom::Start(offset as u64)).map_err(to_driver_error)?;
        file.read_exact(buf).map_err(to_driver_error)
    }

    fn write(
        &mut self,
        handle: &FlashHandle,
        offset: usize,
        data: &[u8],
    ) -> Result<(), DriverError> {
        trace!("write {} bytes at {:#x} in {}", data.len(), offset, handle.info.role);
        let mut file = &handle.file;
        check_bounds(handle, offset, data.len())?;
        file.seek(SeekFrom::Start(offset as u64)).map_err(to_driver_error)?;
        file.write_all(data).map_err(to_driver_error)
    }

    fn erase(
        &mut self,
        handle: &FlashHandle,
        offset: usize,
        len: usize,
    ) -> Result<(), DriverError> {
        debug!("erase {} bytes at {:#x} in {}", len, offset, handle.info.role);
        let mut file = &handle.file;
        check_bounds(handle, offset, len)?;
        file.seek(SeekFrom::Start(offset as u64)).map_err(to_driver_error)?;
        let blank = [0xFFu8; 256];
        let mut left = len;
        while left > 0 {
            let n = left.min(blank.len());
            file.write_all(&blank[..n]).map_err(to_driver_error)?;
            left -= n;
        }
        Ok(())
    }

    fn close(&mut self, handle: FlashHandle) {
        if let Err(e) = handle.file.sync_all() {
            debug!("sync of {} failed: {}", handle.info.role, e);
        }
    }
}

impl BootModeRegister for FileFlash {
    fn set_boot_mode(&mut self, mode: BootMode) -> Result<(), DriverError> {
        let mut file = File::create(self.dir.join(BOOT_MODE_FILE)).map_err(to_driver_error)?;
        file.write_all(&[mode.value()]).map_err(to_driver_error)?;
        file.sync_all().map_err(to_driver_error)
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn check_bounds(handle: &FlashHandle, offset: usize, len: usize) -> Result<(), DriverError> {
    match offset.checked_add(len) {
        Some(end) if end <= handle.info.size => Ok(()),
        _ => Err(DriverError(EINVAL)),
    }
}

/// Negative errno, the way drivers report failures.
fn to_driver_error(e: io::Error) -> DriverError {
    DriverError(e.raw_os_error().map(|code| -code).unwrap_or(EIO))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::scratch_dir;

    fn flash_with(role: RegionRole, content: &[u8], name: &str) -> FileFlash {
        let dir = scratch_dir(name);
        std::fs::write(dir.join(format!("{}.bin", role)), content).unwrap();
        FileFlash::new(dir)
    }

    #[test]
    fn read_write_erase_hit_the_file() {
        let mut flash = flash_with(RegionRole::S0, &[0u8; 600], "flash-rwe");
        let handle = flash.open(RegionRole::S0).unwrap();
        assert_eq!(flash.info(&handle).size, 600);

        flash.write(&handle, 300, &[1, 2, 3]).unwrap();
        flash.erase(&handle, 0, 10).unwrap();
        let mut buf = [0u8; 3];
        flash.read(&handle, 300, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        flash.close(handle);

        let content = std::fs::read(flash.region_path(RegionRole::S0)).unwrap();
        assert_eq!(content.len(), 600);
        assert!(content[..10].iter().all(|b| *b == 0xFF));
        assert_eq!(content[10], 0);
        assert_eq!(&content[300..303], &[1, 2, 3]);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut flash = flash_with(RegionRole::S1, &[0u8; 16], "flash-bounds");
        let handle = flash.open(RegionRole::S1).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(flash.read(&handle, 12, &mut buf), Err(DriverError(EINVAL)));
        assert_eq!(flash.write(&handle, 9, &buf), Err(DriverError(EINVAL)));
        assert_eq!(flash.erase(&handle, 0, 17), Err(DriverError(EINVAL)));
        flash.close(handle);
    }

    #[test]
    fn missing_region_fails_to_open() {
        let mut flash = FileFlash::new(scratch_dir("flash-missing"));
        assert!(flash.open(RegionRole::Provision).is_err());
    }

    #[test]
    fn boot_mode_register_holds_one_byte() {
        let mut flash = FileFlash::new(scratch_dir("flash-bootmode"));
        assert_eq!(flash.boot_mode_value().unwrap(), None);
        flash.set_boot_mode(BootMode::Loader).unwrap();
        flash.set_boot_mode(BootMode::FactoryReset).unwrap();
        assert_eq!(flash.boot_mode_value().unwrap(), Some(0xAC));
    }
}

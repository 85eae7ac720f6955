//! Firmware descriptor lookup in a storage region.
//!
//! A firmware image carries a `fw_info` descriptor at one of a few fixed
//! offsets from its start. The descriptor is a sequence of little-endian
//! 32-bit words:
//!
//! ```text
//! word  0..3   magic (common, fw_info, compatibility id)
//! word  3      total_size    size of the descriptor itself
//! word  4      size          size of the image
//! word  5      version
//! word  6      address       load address of the image
//! word  7      boot_address  entry point, inside the image
//! word  8      valid         FW_INFO_VALID while the image may boot
//! word  9..13  reserved
//! ```
//!
//! Only the structure is checked here; signatures are verified by the boot
//! stage that consumes the image.

use std::convert::TryInto;

use log::{error, info};

use crate::error::{Error, Result};
use crate::platform::RegionIo;
use crate::region::{with_region, RegionRole};

/// Magic words opening every firmware descriptor.
pub const FW_INFO_MAGIC: [u32; 3] = [0x281e_e6de, 0x8fce_bb4c, 0x0000_3402];
/// Value of the `valid` word of a bootable image.
pub const FW_INFO_VALID: u32 = 0x9102_ffff;
/// Offsets from the start of an image where a descriptor may live.
pub const FW_INFO_OFFSETS: [usize; 5] = [0x0000, 0x0200, 0x0400, 0x0800, 0x1000];

const WORDS: usize = 13;
const HEADER_BUF_LEN: usize = FW_INFO_OFFSETS[FW_INFO_OFFSETS.len() - 1] + FwInfo::LEN;

// =============================================================================
// Public Interface
// =============================================================================

/// A parsed firmware descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FwInfo {
    pub total_size: u32,
    pub size: u32,
    pub version: u32,
    pub address: u32,
    pub boot_address: u32,
    pub valid: u32,
}
impl FwInfo {
    /// Encoded size of a descriptor in bytes.
    pub const LEN: usize = WORDS * 4;

    /// A valid descriptor for an image of `size` bytes loaded at `address`,
    /// booting at its start.
    pub fn new(size: u32, version: u32, address: u32) -> Self {
        FwInfo {
            total_size: FwInfo::LEN as u32,
            size,
            version,
            address,
            boot_address: address,
            valid: FW_INFO_VALID,
        }
    }

    /// Parse a descriptor from the start of `bytes`. Returns `None` unless the
    /// magic matches and the fields are consistent with each other.
    pub fn parse(bytes: &[u8]) -> Option<FwInfo> {
        let bytes = bytes.get(..FwInfo::LEN)?;
        let mut words = [0u32; WORDS];
        for (word, raw) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes(raw.try_into().ok()?);
        }
        if words[..3] != FW_INFO_MAGIC {
            return None;
        }
        let info = FwInfo {
            total_size: words[3],
            size: words[4],
            version: words[5],
            address: words[6],
            boot_address: words[7],
            valid: words[8],
        };
        let consistent = info.valid == FW_INFO_VALID
            && info.total_size as usize >= FwInfo::LEN
            && info.size != 0
            && info.boot_address.wrapping_sub(info.address) < info.size;
        if consistent {
            Some(info)
        } else {
            None
        }
    }

    /// Look for a valid descriptor at every candidate offset that fits in
    /// `image`.
    pub fn find(image: &[u8]) -> Option<FwInfo> {
        FW_INFO_OFFSETS
            .iter()
            .filter_map(|&offset| image.get(offset..))
            .find_map(FwInfo::parse)
    }

    pub fn encode(&self) -> [u8; FwInfo::LEN] {
        let words: [u32; WORDS] = [
            FW_INFO_MAGIC[0],
            FW_INFO_MAGIC[1],
            FW_INFO_MAGIC[2],
            self.total_size,
            self.size,
            self.version,
            self.address,
            self.boot_address,
            self.valid,
            0,
            0,
            0,
            0,
        ];
        let mut out = [0u8; FwInfo::LEN];
        for (raw, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            raw.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// Check that `role` holds a firmware image with a well formed descriptor.
///
/// Reads the header prefix of the region (clamped to the region size) in one
/// go. Open, read and parse failures are all reported as
/// [`Error::InvalidImage`].
pub fn validate<P: RegionIo>(io: &mut P, role: RegionRole) -> Result<FwInfo> {
    let mut buf = [0u8; HEADER_BUF_LEN];

    let found = with_region(io, role, |io, handle| {
        let info = io.info(handle);
        let len = HEADER_BUF_LEN.min(info.size);
        if let Err(rc) = io.read(handle, 0, &mut buf[..len]) {
            error!(
                "Failed to read flash area {}, address {:#010x}, size={}, {}",
                role, info.base_offset, len, rc
            );
            return Err(Error::InvalidImage(role));
        }
        FwInfo::find(&buf[..len]).ok_or_else(|| {
            error!("Failed to find fw_info for image in flash area {}", role);
            Error::InvalidImage(role)
        })
    });

    match found {
        Ok(fw_info) => {
            info!(
                "Check image in flash area {}: OK (version {}, {} bytes)",
                role, fw_info.version, fw_info.size
            );
            Ok(fw_info)
        }
        Err(_) => Err(Error::InvalidImage(role)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockBoard};

    fn image_with_header_at(offset: usize, size: usize) -> Vec<u8> {
        let mut image = vec![0xA5; size];
        let header = FwInfo::new(size as u32, 3, 0x8000).encode();
        image[offset..offset + FwInfo::LEN].copy_from_slice(&header);
        image
    }

    #[test]
    fn parse_accepts_encoded_descriptor() {
        let info = FwInfo::new(0x1_0000, 7, 0x8000);
        assert_eq!(FwInfo::parse(&info.encode()), Some(info));
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut raw = FwInfo::new(0x1_0000, 7, 0x8000).encode();
        raw[4] ^= 0xFF;
        assert_eq!(FwInfo::parse(&raw), None);
    }

    #[test]
    fn parse_rejects_invalidated_image() {
        let mut info = FwInfo::new(0x1_0000, 7, 0x8000);
        info.valid = 0;
        assert_eq!(FwInfo::parse(&info.encode()), None);
    }

    #[test]
    fn parse_rejects_boot_address_outside_image() {
        let mut info = FwInfo::new(0x100, 1, 0x8000);
        info.boot_address = 0x8100;
        assert_eq!(FwInfo::parse(&info.encode()), None);
        info.boot_address = 0x7FFC;
        assert_eq!(FwInfo::parse(&info.encode()), None);
    }

    #[test]
    fn parse_rejects_short_total_size() {
        let mut info = FwInfo::new(0x100, 1, 0x8000);
        info.total_size = 8;
        assert_eq!(FwInfo::parse(&info.encode()), None);
    }

    #[test]
    fn parse_rejects_truncated_input() {
        let raw = FwInfo::new(0x100, 1, 0x8000).encode();
        assert_eq!(FwInfo::parse(&raw[..FwInfo::LEN - 1]), None);
    }

    #[test]
    fn find_looks_at_every_candidate_offset() {
        for &offset in FW_INFO_OFFSETS.iter() {
            let image = image_with_header_at(offset, 0x2000);
            assert!(FwInfo::find(&image).is_some(), "offset {:#x}", offset);
        }
        let image = image_with_header_at(0x300, 0x2000);
        assert!(FwInfo::find(&image).is_none());
    }

    #[test]
    fn validate_reads_clamped_prefix_once() {
        let mut board =
            MockBoard::new().with_region(RegionRole::S0Ext, image_with_header_at(0, 4096));
        let info = validate(&mut board, RegionRole::S0Ext).unwrap();
        assert_eq!(info.size, 4096);
        assert_eq!(
            board.count(|c| matches!(c, Call::Read(..))),
            1,
            "one bounded read"
        );
        assert!(board.calls().contains(&Call::Read(RegionRole::S0Ext, 0, 4096)));
        assert_eq!(board.count(Call::is_destructive), 0);
        assert_eq!(board.open_handles(), 0);
    }

    #[test]
    fn validate_reads_full_prefix_of_large_region() {
        let mut board =
            MockBoard::new().with_region(RegionRole::S1Ext, image_with_header_at(0x800, 0x8000));
        validate(&mut board, RegionRole::S1Ext).unwrap();
        assert!(board
            .calls()
            .contains(&Call::Read(RegionRole::S1Ext, 0, HEADER_BUF_LEN)));
    }

    #[test]
    fn validate_reports_corrupted_header() {
        let mut image = image_with_header_at(0, 4096);
        image[0] = 0;
        let mut board = MockBoard::new().with_region(RegionRole::S0Ext, image);
        assert_eq!(
            validate(&mut board, RegionRole::S0Ext),
            Err(Error::InvalidImage(RegionRole::S0Ext))
        );
        assert_eq!(board.open_handles(), 0);
    }

    #[test]
    fn validate_maps_io_failures_to_invalid_image() {
        let mut board = MockBoard::new()
            .with_region(RegionRole::S0Ext, image_with_header_at(0, 4096))
            .failing(Call::Read(RegionRole::S0Ext, 0, 0));
        assert_eq!(
            validate(&mut board, RegionRole::S0Ext),
            Err(Error::InvalidImage(RegionRole::S0Ext))
        );
        assert_eq!(board.open_handles(), 0);

        let mut board = MockBoard::new();
        assert_eq!(
            validate(&mut board, RegionRole::S1Ext),
            Err(Error::InvalidImage(RegionRole::S1Ext))
        );
    }
}

//! Chunked copy and verification between two regions of equal size.
//!
//! Both operations walk the source region from offset `0` in chunks of
//! [`CHUNK_SIZE`] bytes (the last chunk may be shorter), staging data in a
//! caller-owned [`Scratch`]. The two regions are opened for the duration of
//! one operation and closed before it returns, on success and on failure.
//!
//! Storage failures are returned immediately and never retried.

use log::{debug, error, info, log_enabled, trace, Level::Debug};

use hexplay::HexViewBuilder;

use crate::error::{Error, IoOp, Result};
use crate::platform::RegionIo;
use crate::region::{with_region, RegionInfo, RegionRole};
use crate::settings::CHUNK_SIZE;

// =============================================================================
// Public Interface
// =============================================================================

/// Staging buffers for one transfer: one chunk read from the source and one
/// read back from the destination.
pub struct Scratch {
    src: [u8; CHUNK_SIZE],
    dst: [u8; CHUNK_SIZE],
}
impl Scratch {
    pub fn new() -> Self {
        Scratch {
            src: [0; CHUNK_SIZE],
            dst: [0; CHUNK_SIZE],
        }
    }
}
impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Erase `dst` entirely, then copy `src` into it chunk by chunk.
pub fn copy<P: RegionIo>(
    io: &mut P,
    dst: RegionRole,
    src: RegionRole,
    scratch: &mut Scratch,
) -> Result<()> {
    copy_with(io, dst, src, true, scratch)
}

/// Copy `src` into `dst` chunk by chunk, erasing `dst` first when `erase_dst`
/// is set. Without the erase, `dst` must already be blank.
pub fn copy_with<P: RegionIo>(
    io: &mut P,
    dst: RegionRole,
    src: RegionRole,
    erase_dst: bool,
    scratch: &mut Scratch,
) -> Result<()> {
    info!("Copy image {} -> {}", src, dst);
    process(io, dst, src, erase_dst, scratch, |io, handle, dst_info, offset, chunk, _| {
        trace!("write {} bytes at {:#010x}", chunk.len(), offset);
        io.write(handle, offset, chunk).map_err(|source| {
            error!(
                "Failed to write at address {:#010x}, {}",
                dst_info.base_offset + offset,
                source
            );
            Error::IoFault {
                role: dst_info.role,
                op: IoOp::Write,
                offset,
                source,
            }
        })?;
        Ok(true)
    })
    .map(|_| ())
}

/// Compare `dst` against `src` byte for byte.
///
/// Returns `Ok(false)` at the first chunk that differs, without reading any
/// further. Storage failures are errors; a difference is not.
pub fn compare<P: RegionIo>(
    io: &mut P,
    dst: RegionRole,
    src: RegionRole,
    scratch: &mut Scratch,
) -> Result<bool> {
    first_mismatch(io, dst, src, scratch).map(|mismatch| mismatch.is_none())
}

/// Like [`compare`], but reports the offset of the first chunk that differs.
pub fn first_mismatch<P: RegionIo>(
    io: &mut P,
    dst: RegionRole,
    src: RegionRole,
    scratch: &mut Scratch,
) -> Result<Option<usize>> {
    debug!("Compare image {} against {}", dst, src);
    let mut mismatch = None;
    process(
        io,
        dst,
        src,
        false,
        scratch,
        |io, handle, dst_info, offset, chunk, readback| {
            io.read(handle, offset, readback).map_err(|source| {
                error!(
                    "Failed to read flash at address {:#010x}, {}",
                    dst_info.base_offset + offset,
                    source
                );
                Error::IoFault {
                    role: dst_info.role,
                    op: IoOp::Read,
                    offset,
                    source,
                }
            })?;

            if chunk != &readback[..] {
                info!(
                    "memcmp failed at address {:#010x}",
                    dst_info.base_offset + offset
                );
                if log_enabled!(Debug) {
                    let src_view = HexViewBuilder::new(chunk)
                        .address_offset(offset)
                        .row_width(16)
                        .finish();
                    let dst_view = HexViewBuilder::new(readback)
                        .address_offset(offset)
                        .row_width(16)
                        .finish();
                    debug!("src:\n{}", src_view);
                    debug!("dst:\n{}", dst_view);
                }
                mismatch = Some(offset);
                return Ok(false);
            }
            Ok(true)
        },
    )?;
    Ok(mismatch)
}

// =============================================================================
// Private stuff
// =============================================================================

/// Open both regions, check their sizes, optionally erase the destination,
/// then feed every source chunk to `step` until it returns `Ok(false)`.
///
/// `step` gets the destination handle, its attributes, the chunk offset, the
/// source chunk and a spare buffer of the same length.
fn process<P, F>(
    io: &mut P,
    dst: RegionRole,
    src: RegionRole,
    erase_dst: bool,
    scratch: &mut Scratch,
    mut step: F,
) -> Result<bool>
where
    P: RegionIo,
    F: FnMut(&mut P, &P::Handle, RegionInfo, usize, &[u8], &mut [u8]) -> Result<bool>,
{
    with_region(io, dst, |io, dst_handle| {
        with_region(io, src, |io, src_handle| {
            let dst_info = io.info(dst_handle);
            let src_info = io.info(src_handle);

            if dst_info.size != src_info.size {
                error!(
                    "Image size mismatch: {} ({}) != {} ({})",
                    dst_info.size, dst, src_info.size, src
                );
                return Err(Error::ConfigurationFault {
                    dst,
                    dst_size: dst_info.size,
                    src,
                    src_size: src_info.size,
                });
            }

            if erase_dst {
                io.erase(dst_handle, 0, dst_info.size).map_err(|source| {
                    error!(
                        "Failed to erase flash area {} (address {:#010x}, size {:#010x}), {}",
                        dst, dst_info.base_offset, dst_info.size, source
                    );
                    Error::IoFault {
                        role: dst,
                        op: IoOp::Erase,
                        offset: 0,
                        source,
                    }
                })?;
            }

            let mut offset = 0;
            while offset < src_info.size {
                let len = CHUNK_SIZE.min(src_info.size - offset);
                let chunk = &mut scratch.src[..len];

                io.read(src_handle, offset, chunk).map_err(|source| {
                    error!(
                        "Failed to read flash area {}, address {:#010x}, {}",
                        src,
                        src_info.base_offset + offset,
                        source
                    );
                    Error::IoFault {
                        role: src,
                        op: IoOp::Read,
                        offset,
                        source,
                    }
                })?;

                if !step(
                    io,
                    dst_handle,
                    dst_info,
                    offset,
                    &scratch.src[..len],
                    &mut scratch.dst[..len],
                )? {
                    return Ok(false);
                }
                offset += len;
            }
            Ok(true)
        })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

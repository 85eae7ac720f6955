//! Error taxonomy of the recovery engine.
//!
//! Every fallible step of the recovery returns one of these values. None of
//! them is handled locally: the top-level driver in
//! [`recovery`](crate::recovery) matches on the failure and enters fault
//! containment, which never returns.

use thiserror::Error;

use crate::platform::DriverError;
use crate::region::RegionRole;

/// The storage operation that failed, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Open,
    Read,
    Write,
    Erase,
}

/// Errors returned by the image validator, the transfer engine and the
/// recovery planner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Paired regions do not have the same size. Detected before any write.
    #[error("region size mismatch: {dst} has {dst_size} bytes, {src} has {src_size} bytes")]
    ConfigurationFault {
        dst: RegionRole,
        dst_size: usize,
        src: RegionRole,
        src_size: usize,
    },

    /// A storage primitive failed. Never retried.
    #[error("{op:?} failed on {role} at offset {offset:#010x}: {source}")]
    IoFault {
        role: RegionRole,
        op: IoOp,
        offset: usize,
        source: DriverError,
    },

    /// The region does not hold a well formed firmware descriptor.
    #[error("no valid firmware descriptor in {0}")]
    InvalidImage(RegionRole),

    /// The destination does not read back identical to the source after a
    /// copy.
    #[error("verification of {dst} against {src} failed at offset {offset:#010x}")]
    VerifyMismatch {
        dst: RegionRole,
        src: RegionRole,
        offset: usize,
    },

    /// The boot-mode register could not be written.
    #[error("boot-mode register write failed: {0}")]
    CommitFault(DriverError),
}

pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Fault classification
// =============================================================================

/// Why fault containment was entered. The category selects how many times the
/// red LED blinks in each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Unrecoverable kernel or system fault reported by the platform.
    SystemHalt,
    /// A runtime assertion failed.
    Assertion,
    /// Any step of the factory firmware recovery failed.
    RecoveryFailed,
}

/// The value handed to fault containment: the category and its blink count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    pub kind: FaultKind,
    pub blinks: u32,
}

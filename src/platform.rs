//! Interfaces of the collaborators consumed by the recovery engine.
//!
//! The engine never talks to hardware directly. A board (or the host
//! simulator, or a test double) implements these traits, and every operation
//! of the engine is generic over a [`Platform`], which is simply the sum of
//! all of them.
//!
//! All calls are synchronous: storage primitives block until they complete or
//! fail, and polling loops block through [`System::sleep_ms`].

use std::fmt;

use thiserror::Error;

use crate::region::{RegionInfo, RegionRole};

// =============================================================================
// Public Interface
// =============================================================================

/// Raw return code of a failed driver call, as reported by the platform.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("rc={0}")]
pub struct DriverError(pub i32);

/// Storage primitives over regions addressed by role.
///
/// Offsets passed to `read`, `write` and `erase` are relative to the start of
/// the region. A handle stays valid until it is given back with `close`.
pub trait RegionIo {
    type Handle;

    fn open(&mut self, role: RegionRole) -> Result<Self::Handle, DriverError>;

    /// Attributes of an open region.
    fn info(&self, handle: &Self::Handle) -> RegionInfo;

    /// Fill `buf` entirely with the bytes found at `offset`. A short read is
    /// an error.
    fn read(
        &mut self,
        handle: &Self::Handle,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), DriverError>;

    fn write(&mut self, handle: &Self::Handle, offset: usize, data: &[u8])
        -> Result<(), DriverError>;

    fn erase(&mut self, handle: &Self::Handle, offset: usize, len: usize)
        -> Result<(), DriverError>;

    fn close(&mut self, handle: Self::Handle);
}

/// The push button, sampled by polling.
pub trait Button {
    fn is_asserted(&mut self) -> bool;
}

/// One of the two independent LED channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
}

/// Patterns the indicator generates on its own, without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Red and green alternate every 500 ms while the recovery is running.
    RecoveryInProgress,
}

/// The two-channel LED driver.
pub trait Indicator {
    fn set(&mut self, channel: Channel, on: bool);
    fn start_pattern(&mut self, kind: PatternKind);
    /// Stop any running pattern and leave both channels off.
    fn stop_pattern(&mut self);

    fn set_both(&mut self, on: bool) {
        self.set(Channel::Red, on);
        self.set(Channel::Green, on);
    }
}

/// Values understood by the next boot stage in the boot-mode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Start the firmware loader (update mode).
    Loader,
    /// Factory firmware was restored, finish the factory reset.
    FactoryReset,
}
impl BootMode {
    pub fn value(self) -> u8 {
        match self {
            BootMode::Loader => 0x01,
            BootMode::FactoryReset => 0xAC,
        }
    }
}
impl fmt::Display for BootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:#04x})", self, self.value())
    }
}

/// The persistent register read by the next boot stage.
pub trait BootModeRegister {
    fn set_boot_mode(&mut self, mode: BootMode) -> Result<(), DriverError>;
}

/// Clock, sleep, interrupt masking and reset.
pub trait System {
    /// Milliseconds since boot. Wraps around; always compare with
    /// [`elapsed_ms`].
    fn now_ms(&mut self) -> u32;
    fn sleep_ms(&mut self, ms: u32);
    fn mask_interrupts(&mut self);
    /// Cold reset of the device.
    fn reset(&mut self) -> !;
}

/// Everything the recovery engine needs from the board.
pub trait Platform: RegionIo + Button + Indicator + BootModeRegister + System {}
impl<T> Platform for T where T: RegionIo + Button + Indicator + BootModeRegister + System {}

/// Milliseconds elapsed from `since` to `now` on a wrapping clock.
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

// =============================================================================
// Unit Tests
// =============================================================================

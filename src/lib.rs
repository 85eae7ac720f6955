//! Fwrecover is the factory firmware recovery stage of a secure bootloader.
//! When the firmware of a device is broken, holding its button at power-on
//! restores the factory images kept in external flash, wipes the user data and
//! asks the next boot stage to finish the factory reset.
//!
//! The stage runs once at every reset, before the normal boot path:
//!
//! * A button held for the whole threshold starts the factory firmware
//!   recovery, which always ends with a reset of the device.
//! * A shorter press selects the firmware loader for the next boot stage.
//! * Otherwise the boot continues untouched.
//!
//! Every backup image is checked before anything is written, every restored
//! partition is read back and compared with its backup, and the boot-mode
//! register is only committed when all of that succeeded. Any failure is
//! terminal: the device blinks a fault code on its red LED until the operator
//! releases then presses the button again.
//!
//! The engine never talks to hardware directly. Storage regions, the button,
//! the LEDs, the boot-mode register and the clock are reached through the
//! traits of the [`platform`] module, which makes it possible to run the very
//! same code in the host simulator (see [`host`]) and in the unit tests.
//!
//! The polling loops of the stage are implemented as state machines, advanced
//! one button sample at a time. State machines are implemented in terms of
//! **states** and **transitions** between them with the following
//! characteristics:
//!
//! * Can only be in one state at any time.
//! * Each state can have its own associated data if needed.
//! * It is possible to have some shared data between **all** states.
//! * Transitions between states are triggered via typed **events** and follow
//!   defined semantics.
//! * Transitioning from one state to another consumes the original state and
//!   renders it unusable. Any transition back to that state would create a new
//!   state.
//!
//! The implementation of state transitions leverages `rust`'s `From` and `Into`
//! pattern. Only transitions for which the `From` trait is implemented are
//! authorized and any other transition would be detected at compile-time as an
//! error.

pub mod boot_decision;
pub mod boot_stage;
pub mod containment;
pub mod error;
pub mod hooks;
pub mod host;
pub mod image;
pub mod platform;
pub mod recovery;
pub mod region;
mod settings;
pub mod transfer;

#[cfg(test)]
mod mock;

pub use boot_decision::BootDecision;
pub use boot_stage::run_boot_stage;
pub use error::{Error, FaultKind, FaultRecord, Result};
pub use recovery::RecoveryPlan;
pub use region::RegionRole;
pub use settings::{Settings, SettingsBuilder, CHUNK_SIZE};

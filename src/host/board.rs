//! The simulated board: file-backed flash, terminal LEDs, and a button that is
//! either scripted or driven from the keyboard.

use std::path::Path;
use std::{process, thread, time::Duration, time::Instant};

use console::style;
use log::{debug, info, warn};

use super::flash::{FileFlash, FlashHandle};
use super::keyboard::{self, KeyAction};
use super::layout;
use super::leds::LedDisplay;
use crate::platform::{
    BootMode, BootModeRegister, Button, Channel, DriverError, Indicator, PatternKind, RegionIo,
    System,
};
use crate::region::{RegionInfo, RegionRole};

/// Exit code of the simulator when the board is reset.
pub const RESET_EXIT_CODE: i32 = 3;

/// Where the button state comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonInput {
    /// Never pressed.
    Released,
    /// Pressed at power-on and released after the given time.
    HeldFor { ms: u32 },
    /// The space bar toggles the button.
    Keyboard,
}

pub struct HostBoard {
    flash: FileFlash,
    leds: LedDisplay,
    input: ButtonInput,
    pressed: bool,
    start: Instant,
    masked: bool,
}
impl HostBoard {
    /// Board over the region files of `dir`. The keyboard input puts the
    /// terminal in raw mode until the board is dropped or reset.
    pub fn new(dir: &Path, input: ButtonInput) -> crossterm::Result<Self> {
        if input == ButtonInput::Keyboard {
            keyboard::enter_raw_mode()?;
            info!("Press {} to toggle the button", style("Space").cyan());
        }
        Ok(HostBoard {
            flash: FileFlash::new(dir).with_base_offsets(layout::base_offsets()),
            leds: LedDisplay::new(),
            input,
            pressed: false,
            start: Instant::now(),
            masked: false,
        })
    }

    fn restore_terminal(&self) {
        if self.input == ButtonInput::Keyboard {
            if let Err(e) = keyboard::leave_raw_mode() {
                warn!("failed to restore the terminal: {}", e);
            }
        }
    }

    fn poll_keyboard(&mut self) {
        let actions = match keyboard::poll_keys() {
            Ok(actions) => actions,
            Err(e) => {
                warn!("keyboard: {}", e);
                return;
            }
        };
        for action in actions {
            match action {
                KeyAction::ToggleButton => {
                    self.pressed = !self.pressed;
                    debug!("button {}", if self.pressed { "pressed" } else { "released" });
                }
                KeyAction::Quit => {
                    self.leds.finish("quit");
                    self.restore_terminal();
                    process::exit(0);
                }
            }
        }
    }
}
impl Drop for HostBoard {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}

impl RegionIo for HostBoard {
    type Handle = FlashHandle;

    fn open(&mut self, role: RegionRole) -> Result<FlashHandle, DriverError> {
        self.flash.open(role)
    }

    fn info(&self, handle: &FlashHandle) -> RegionInfo {
        self.flash.info(handle)
    }

    fn read(
        &mut self,
        handle: &FlashHandle,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), DriverError> {
        self.flash.read(handle, offset, buf)
    }

    fn write(
        &mut self,
        handle: &FlashHandle,
        offset: usize,
        data: &[u8],
    ) -> Result<(), DriverError> {
        self.flash.write(handle, offset, data)
    }

    fn erase(
        &mut self,
        handle: &FlashHandle,
        offset: usize,
        len: usize,
    ) -> Result<(), DriverError> {
        self.flash.erase(handle, offset, len)
    }

    fn close(&mut self, handle: FlashHandle) {
        self.flash.close(handle)
    }
}

impl BootModeRegister for HostBoard {
    fn set_boot_mode(&mut self, mode: BootMode) -> Result<(), DriverError> {
        self.flash.set_boot_mode(mode)
    }
}

impl Button for HostBoard {
    fn is_asserted(&mut self) -> bool {
        match self.input {
            ButtonInput::Released => false,
            ButtonInput::HeldFor { ms } => self.now_ms() < ms,
            ButtonInput::Keyboard => {
                self.poll_keyboard();
                self.pressed
            }
        }
    }
}

impl Indicator for HostBoard {
    fn set(&mut self, channel: Channel, on: bool) {
        self.leds.set(channel, on);
    }

    fn start_pattern(&mut self, kind: PatternKind) {
        self.leds.start_pattern(kind);
    }

    fn stop_pattern(&mut self) {
        self.leds.stop_pattern();
    }
}

impl System for HostBoard {
    fn now_ms(&mut self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn sleep_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms.into()));
    }

    fn mask_interrupts(&mut self) {
        if !self.masked {
            debug!("interrupts masked");
            self.masked = true;
        }
    }

    fn reset(&mut self) -> ! {
        self.leds.finish("reset");
        self.restore_terminal();
        println!("{}", style("[FR] 🔁 board reset").yellow());
        process::exit(RESET_EXIT_CODE);
    }
}

//! Host simulator of the recovery stage.
//!
//! Runs the real engine against a directory of region image files, with the
//! LEDs drawn on the terminal and the button either scripted or mapped to the
//! space bar. Used by the `fwrecover` binary.

mod board;
mod flash;
mod keyboard;
mod layout;
mod leds;

pub use board::{ButtonInput, HostBoard, RESET_EXIT_CODE};
pub use flash::{FileFlash, FlashHandle, BOOT_MODE_FILE};
pub use layout::{
    base_offsets, corrupt_descriptor, existing_files, init_layout, Partition, DEFAULT_LAYOUT,
};
pub use leds::LedDisplay;

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    /// An empty directory private to one test.
    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("fwrecover-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

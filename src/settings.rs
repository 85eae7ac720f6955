//! Timing and signalling settings of the recovery stage.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values. The defaults are the values the
//! bootloader ships with; the host simulator and the tests override some of
//! them.

use crate::error::{FaultKind, FaultRecord};

/// Size in bytes of one transfer chunk. It sizes the scratch buffers, so it is
/// fixed at compile time.
pub const CHUNK_SIZE: usize = 256;

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings of the recovery stage and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// How long the button must be held at boot to start the factory firmware
    /// recovery. A shorter press selects the loader mode.
    pub recovery_hold_ms: u32,
    /// Sampling period of the button while deciding the boot mode.
    pub decision_poll_ms: u32,

    /// How long the red LED stays on for each blink of a fault code.
    pub blink_on_ms: u32,
    /// Sampling period of the button while blinking a fault code. Also the
    /// off time between two blinks.
    pub fault_poll_ms: u32,
    /// Idle time between two repetitions of a fault code.
    pub blink_gap_ms: u32,

    /// Number of blinks for an unrecoverable system fault.
    pub blinks_on_system_halt: u32,
    /// Number of blinks for a failed runtime assertion.
    pub blinks_on_assert: u32,
    /// Number of blinks for a failed factory firmware recovery.
    pub blinks_on_recovery_fail: u32,

    /// Delay between the press that leaves fault containment and the reset.
    pub fault_reboot_delay_ms: u32,
    /// Sampling period of the button while waiting for its release at the end
    /// of a successful recovery.
    pub release_poll_ms: u32,
    /// Delay before the reset that ends a successful recovery.
    pub recovery_reboot_delay_ms: u32,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}
impl Settings {
    /// The fault record to blink for a given fault category.
    pub fn fault_record(&self, kind: FaultKind) -> FaultRecord {
        let blinks = match kind {
            FaultKind::SystemHalt => self.blinks_on_system_halt,
            FaultKind::Assertion => self.blinks_on_assert,
            FaultKind::RecoveryFailed => self.blinks_on_recovery_fail,
        };
        FaultRecord { kind, blinks }
    }
}
impl Default for Settings {
    fn default() -> Self {
        SettingsBuilder::new().finalize()
    }
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// use fwrecover::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().recovery_hold_ms(3_000).finalize();
/// assert_eq!(settings.recovery_hold_ms, 3_000);
/// ```
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values.
    pub fn new() -> Self {
        SettingsBuilder {
            settings: Settings {
                recovery_hold_ms: 10_000,
                decision_poll_ms: 10,
                blink_on_ms: 100,
                fault_poll_ms: 100,
                blink_gap_ms: 900,
                blinks_on_system_halt: 5,
                blinks_on_assert: 4,
                blinks_on_recovery_fail: 3,
                fault_reboot_delay_ms: 100,
                release_poll_ms: 10,
                recovery_reboot_delay_ms: 500,
                _private_use_builder: (),
            },
        }
    }

    /// Set the hold duration that starts the factory firmware recovery
    pub fn recovery_hold_ms(mut self, ms: u32) -> Self {
        self.settings.recovery_hold_ms = ms;
        self
    }

    /// Set the button sampling period used while deciding the boot mode
    pub fn decision_poll_ms(mut self, ms: u32) -> Self {
        self.settings.decision_poll_ms = ms;
        self
    }

    /// Set the on time of one fault code blink
    pub fn blink_on_ms(mut self, ms: u32) -> Self {
        self.settings.blink_on_ms = ms;
        self
    }

    /// Set the button sampling period used while blinking a fault code
    pub fn fault_poll_ms(mut self, ms: u32) -> Self {
        self.settings.fault_poll_ms = ms;
        self
    }

    /// Set the idle time between two repetitions of a fault code
    pub fn blink_gap_ms(mut self, ms: u32) -> Self {
        self.settings.blink_gap_ms = ms;
        self
    }

    /// Set the number of blinks for each fault category
    pub fn blinks(mut self, kind: FaultKind, count: u32) -> Self {
        match kind {
            FaultKind::SystemHalt => self.settings.blinks_on_system_halt = count,
            FaultKind::Assertion => self.settings.blinks_on_assert = count,
            FaultKind::RecoveryFailed => self.settings.blinks_on_recovery_fail = count,
        }
        self
    }

    /// Set the delay between the press leaving fault containment and the reset
    pub fn fault_reboot_delay_ms(mut self, ms: u32) -> Self {
        self.settings.fault_reboot_delay_ms = ms;
        self
    }

    /// Set the button sampling period used while waiting for its release
    pub fn release_poll_ms(mut self, ms: u32) -> Self {
        self.settings.release_poll_ms = ms;
        self
    }

    /// Set the delay before the reset that ends a successful recovery
    pub fn recovery_reboot_delay_ms(mut self, ms: u32) -> Self {
        self.settings.recovery_reboot_delay_ms = ms;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}
impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            recovery_hold_ms: 10_000,
            decision_poll_ms: 10,
            blink_on_ms: 100,
            fault_poll_ms: 100,
            blink_gap_ms: 900,
            blinks_on_system_halt: 5,
            blinks_on_assert: 4,
            blinks_on_recovery_fail: 3,
            fault_reboot_delay_ms: 100,
            release_poll_ms: 10,
            recovery_reboot_delay_ms: 500,
            _private_use_builder: (),
        }
    )
}

#[test]
fn recovery_hold_ms() {
    let settings = SettingsBuilder::new().recovery_hold_ms(2_000).finalize();
    assert_eq!(settings.recovery_hold_ms, 2_000);
}

#[test]
fn blink_timings() {
    let settings = SettingsBuilder::new()
        .blink_on_ms(50)
        .fault_poll_ms(25)
        .blink_gap_ms(400)
        .finalize();
    assert_eq!(settings.blink_on_ms, 50);
    assert_eq!(settings.fault_poll_ms, 25);
    assert_eq!(settings.blink_gap_ms, 400);
}

#[test]
fn blink_counts_are_distinct_per_fault() {
    let settings = Settings::default();
    let halt = settings.fault_record(FaultKind::SystemHalt).blinks;
    let assert = settings.fault_record(FaultKind::Assertion).blinks;
    let recovery = settings.fault_record(FaultKind::RecoveryFailed).blinks;
    assert_ne!(halt, assert);
    assert_ne!(halt, recovery);
    assert_ne!(assert, recovery);
}

#[test]
fn blinks() {
    let settings = SettingsBuilder::new()
        .blinks(FaultKind::RecoveryFailed, 7)
        .finalize();
    assert_eq!(
        settings.fault_record(FaultKind::RecoveryFailed),
        FaultRecord {
            kind: FaultKind::RecoveryFailed,
            blinks: 7
        }
    );
}

#[test]
fn reboot_delays() {
    let settings = SettingsBuilder::new()
        .fault_reboot_delay_ms(1)
        .release_poll_ms(2)
        .recovery_reboot_delay_ms(3)
        .decision_poll_ms(4)
        .finalize();
    assert_eq!(settings.fault_reboot_delay_ms, 1);
    assert_eq!(settings.release_poll_ms, 2);
    assert_eq!(settings.recovery_reboot_delay_ms, 3);
    assert_eq!(settings.decision_poll_ms, 4);
}

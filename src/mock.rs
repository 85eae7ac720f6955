//! In-memory board used by the unit tests.
//!
//! Every collaborator call is recorded in a trace. Storage failures can be
//! injected per region and operation, the button follows a script, and the
//! clock only moves when the engine sleeps (plus an optional fixed step per
//! `now_ms` call). `reset()` unwinds with a [`Reset`] payload which the
//! [`expect_reset`] helper catches.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use crate::image::FwInfo;
use crate::platform::{
    BootMode, BootModeRegister, Button, Channel, DriverError, Indicator, PatternKind, RegionIo,
    System,
};
use crate::recovery::FACTORY_JOBS;
use crate::region::{RegionInfo, RegionRole};

const EINVAL: i32 = -22;
const EIO: i32 = -5;
const ENOENT: i32 = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Open(RegionRole),
    Close(RegionRole),
    Read(RegionRole, usize, usize),
    Write(RegionRole, usize, usize),
    Erase(RegionRole, usize, usize),
    Led(Channel, bool),
    StartPattern(PatternKind),
    StopPattern,
    BootMode(BootMode),
    Sleep(u32),
    MaskInterrupts,
    Reset,
}
impl Call {
    pub(crate) fn is_destructive(&self) -> bool {
        matches!(self, Call::Write(..) | Call::Erase(..))
    }
}

/// Panic payload standing for a cold reset.
#[derive(Debug)]
pub(crate) struct Reset;

enum ButtonScript {
    /// One value per sample; the last one repeats forever.
    Samples(VecDeque<bool>),
    /// Asserted while the clock is below the given time.
    HeldUntil(u32),
}

pub(crate) struct MockBoard {
    regions: BTreeMap<RegionRole, Vec<u8>>,
    failures: Vec<(RegionRole, Call)>,
    dropped: Vec<(RegionRole, usize)>,
    boot_mode_fails: bool,
    boot_mode: Option<BootMode>,
    button: ButtonScript,
    samples: usize,
    now: u32,
    tick: u32,
    open: usize,
    calls: Vec<Call>,
}
impl MockBoard {
    pub(crate) fn new() -> Self {
        MockBoard {
            regions: BTreeMap::new(),
            failures: Vec::new(),
            dropped: Vec::new(),
            boot_mode_fails: false,
            boot_mode: None,
            button: ButtonScript::Samples(vec![false].into()),
            samples: 0,
            now: 0,
            tick: 0,
            open: 0,
            calls: Vec::new(),
        }
    }

    pub(crate) fn with_region(mut self, role: RegionRole, content: Vec<u8>) -> Self {
        self.regions.insert(role, content);
        self
    }

    /// Every region of the factory plan with `size` bytes: backups filled
    /// with a pattern (and a valid descriptor when they hold an image),
    /// destinations blank, user data dirty.
    pub(crate) fn with_factory_layout(mut self, size: usize) -> Self {
        for (n, job) in FACTORY_JOBS.iter().enumerate() {
            let mut backup: Vec<u8> = (0..size).map(|i| (i * 13 + n) as u8).collect();
            if job.holds_image {
                let header = FwInfo::new(size as u32, n as u32 + 1, 0x1_0000).encode();
                backup[..FwInfo::LEN].copy_from_slice(&header);
            }
            self.regions.insert(job.src, backup);
            self.regions.insert(job.dst, vec![0; size]);
        }
        self.regions.insert(RegionRole::ExtFlashUserspace, vec![0x5A; size]);
        self
    }

    pub(crate) fn with_button(mut self, samples: &[bool]) -> Self {
        self.button = ButtonScript::Samples(samples.iter().copied().collect());
        self
    }

    pub(crate) fn with_button_held_until(mut self, ms: u32) -> Self {
        self.button = ButtonScript::HeldUntil(ms);
        self
    }

    pub(crate) fn with_clock(mut self, start: u32, tick: u32) -> Self {
        self.now = start;
        self.tick = tick;
        self
    }

    /// Make every call of the same kind as `call` on its region fail,
    /// whatever the offset and length.
    pub(crate) fn failing(mut self, call: Call) -> Self {
        let role = match call {
            Call::Open(r) | Call::Read(r, ..) | Call::Write(r, ..) | Call::Erase(r, ..) => r,
            _ => panic!("cannot inject a failure for {:?}", call),
        };
        self.failures.push((role, call));
        self
    }

    /// Make read calls on `role` fail from `offset` on.
    pub(crate) fn failing_read_at(mut self, role: RegionRole, offset: usize) -> Self {
        self.failures.push((role, Call::Read(role, offset, usize::MAX)));
        self
    }

    /// Acknowledge the write at `offset` of `role` without storing it.
    pub(crate) fn dropping_write_at(mut self, role: RegionRole, offset: usize) -> Self {
        self.dropped.push((role, offset));
        self
    }

    pub(crate) fn failing_boot_mode(mut self) -> Self {
        self.boot_mode_fails = true;
        self
    }

    pub(crate) fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn region(&self, role: RegionRole) -> &[u8] {
        &self.regions[&role]
    }

    pub(crate) fn region_mut(&mut self, role: RegionRole) -> &mut Vec<u8> {
        self.regions.get_mut(&role).unwrap()
    }

    pub(crate) fn open_handles(&self) -> usize {
        self.open
    }

    pub(crate) fn samples(&self) -> usize {
        self.samples
    }

    pub(crate) fn boot_mode(&self) -> Option<BootMode> {
        self.boot_mode
    }

    pub(crate) fn now(&self) -> u32 {
        self.now
    }

    fn injected(&self, role: RegionRole, offset: usize, op: fn(&Call) -> bool) -> bool {
        self.failures.iter().any(|(r, call)| {
            *r == role
                && op(call)
                && match call {
                    Call::Read(_, from, usize::MAX) => offset >= *from,
                    _ => true,
                }
        })
    }

    fn bounds(&self, role: RegionRole, offset: usize, len: usize) -> Result<(), DriverError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.regions[&role].len() => Ok(()),
            _ => Err(DriverError(EINVAL)),
        }
    }
}

impl RegionIo for MockBoard {
    type Handle = RegionRole;

    fn open(&mut self, role: RegionRole) -> Result<RegionRole, DriverError> {
        self.calls.push(Call::Open(role));
        if self.injected(role, 0, |c| matches!(c, Call::Open(_))) {
            return Err(DriverError(EIO));
        }
        if !self.regions.contains_key(&role) {
            return Err(DriverError(ENOENT));
        }
        self.open += 1;
        Ok(role)
    }

    fn info(&self, handle: &RegionRole) -> RegionInfo {
        let index = RegionRole::ALL.iter().position(|r| r == handle).unwrap_or(0);
        RegionInfo {
            role: *handle,
            device_id: if handle.is_external() { "mx25r64" } else { "nrf-flash" },
            base_offset: index * 0x1_0000,
            size: self.regions[handle].len(),
        }
    }

    fn read(&mut self, handle: &RegionRole, offset: usize, buf: &mut [u8]) -> Result<(), DriverError> {
        let role = *handle;
        self.calls.push(Call::Read(role, offset, buf.len()));
        if self.injected(role, offset, |c| matches!(c, Call::Read(..))) {
            return Err(DriverError(EIO));
        }
        self.bounds(role, offset, buf.len())?;
        buf.copy_from_slice(&self.regions[&role][offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, handle: &RegionRole, offset: usize, data: &[u8]) -> Result<(), DriverError> {
        let role = *handle;
        self.calls.push(Call::Write(role, offset, data.len()));
        if self.injected(role, offset, |c| matches!(c, Call::Write(..))) {
            return Err(DriverError(EIO));
        }
        self.bounds(role, offset, data.len())?;
        if self.dropped.contains(&(role, offset)) {
            return Ok(());
        }
        self.regions.get_mut(&role).unwrap()[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn erase(&mut self, handle: &RegionRole, offset: usize, len: usize) -> Result<(), DriverError> {
        let role = *handle;
        self.calls.push(Call::Erase(role, offset, len));
        if self.injected(role, offset, |c| matches!(c, Call::Erase(..))) {
            return Err(DriverError(EIO));
        }
        self.bounds(role, offset, len)?;
        for b in &mut self.regions.get_mut(&role).unwrap()[offset..offset + len] {
            *b = 0xFF;
        }
        Ok(())
    }

    fn close(&mut self, handle: RegionRole) {
        self.calls.push(Call::Close(handle));
        self.open -= 1;
    }
}

impl Button for MockBoard {
    fn is_asserted(&mut self) -> bool {
        self.samples += 1;
        match &mut self.button {
            ButtonScript::Samples(script) => {
                if script.len() > 1 {
                    script.pop_front().unwrap_or(false)
                } else {
                    script.front().copied().unwrap_or(false)
                }
            }
            ButtonScript::HeldUntil(until) => self.now < *until,
        }
    }
}

impl Indicator for MockBoard {
    fn set(&mut self, channel: Channel, on: bool) {
        self.calls.push(Call::Led(channel, on));
    }

    fn start_pattern(&mut self, kind: PatternKind) {
        self.calls.push(Call::StartPattern(kind));
    }

    fn stop_pattern(&mut self) {
        self.calls.push(Call::StopPattern);
    }
}

impl BootModeRegister for MockBoard {
    fn set_boot_mode(&mut self, mode: BootMode) -> Result<(), DriverError> {
        self.calls.push(Call::BootMode(mode));
        if self.boot_mode_fails {
            return Err(DriverError(EIO));
        }
        self.boot_mode = Some(mode);
        Ok(())
    }
}

impl System for MockBoard {
    fn now_ms(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.tick);
        now
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.calls.push(Call::Sleep(ms));
        self.now = self.now.wrapping_add(ms);
    }

    fn mask_interrupts(&mut self) {
        self.calls.push(Call::MaskInterrupts);
    }

    fn reset(&mut self) -> ! {
        self.calls.push(Call::Reset);
        panic::panic_any(Reset)
    }
}

/// Run `f`, which must end in a reset of `board`.
pub(crate) fn expect_reset<F>(board: &mut MockBoard, f: F)
where
    F: FnOnce(&mut MockBoard),
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(board))) {
        Err(payload) if payload.is::<Reset>() => {}
        Err(payload) => panic::resume_unwind(payload),
        Ok(()) => panic!("returned without resetting the board"),
    }
}

//! The two LEDs of the simulated board, drawn on the terminal.
//!
//! Static states are shown as a line with one dot per channel. The recovery
//! pattern is rendered as an `indicatif` spinner alternating red and green
//! every 500 ms, the way the LED driver does it in hardware.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::platform::{Channel, PatternKind};

const PATTERN_PERIOD_MS: u64 = 500;

pub struct LedDisplay {
    pb: ProgressBar,
    red: bool,
    green: bool,
    pattern: Option<PatternKind>,
}
impl LedDisplay {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(static_style());
        let mut display = LedDisplay {
            pb,
            red: false,
            green: false,
            pattern: None,
        };
        display.redraw();
        display
    }

    pub fn set(&mut self, channel: Channel, on: bool) {
        match channel {
            Channel::Red => self.red = on,
            Channel::Green => self.green = on,
        }
        self.redraw();
    }

    pub fn start_pattern(&mut self, kind: PatternKind) {
        self.pattern = Some(kind);
        self.pb.set_style(pattern_style());
        self.pb.set_message(match kind {
            PatternKind::RecoveryInProgress => "factory firmware recovery in progress...",
        });
        self.pb.enable_steady_tick(PATTERN_PERIOD_MS);
    }

    pub fn stop_pattern(&mut self) {
        self.pb.disable_steady_tick();
        self.pattern = None;
        self.red = false;
        self.green = false;
        self.pb.set_style(static_style());
        self.redraw();
    }

    /// Leave the last state on screen.
    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(format!("{} {}", self.dots(), message));
    }

    fn redraw(&mut self) {
        if self.pattern.is_none() {
            self.pb.set_message(self.dots());
        }
    }

    fn dots(&self) -> String {
        let red = if self.red {
            style("●").red().bold()
        } else {
            style("○").dim()
        };
        let green = if self.green {
            style("●").green().bold()
        } else {
            style("○").dim()
        };
        format!("{} {}", red, green)
    }
}
impl Default for LedDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn static_style() -> ProgressStyle {
    ProgressStyle::default_spinner().template("[FR] LEDs {msg}")
}

fn pattern_style() -> ProgressStyle {
    let red = format!("{} {}", style("●").red().bold(), style("○").dim());
    let green = format!("{} {}", style("○").dim(), style("●").green().bold());
    ProgressStyle::default_spinner()
        .tick_strings(&[&red, &green, &red])
        .template("[FR] LEDs {spinner} {msg}")
}

//! Fault code blink schedule.
//!
//! One cycle blinks the red LED `blinks` times (on for `blink_on_ms`, off for
//! `fault_poll_ms`), then stays dark for `blink_gap_ms` split in
//! `fault_poll_ms` slices. The button is sampled after every tick, so the
//! schedule never sleeps longer than one slice without looking at it.

use crate::settings::Settings;

/// One step of the schedule: an optional red LED change, then a sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub red: Option<bool>,
    pub sleep_ms: u32,
}

/// Endless fault code blink schedule.
#[derive(Debug, Clone)]
pub struct BlinkSchedule {
    blinks: u32,
    on_ms: u32,
    poll_ms: u32,
    gap_ticks: u32,
    position: u32,
}
impl BlinkSchedule {
    pub fn new(settings: &Settings, blinks: u32) -> Self {
        let poll_ms = settings.fault_poll_ms.max(1);
        BlinkSchedule {
            blinks,
            on_ms: settings.blink_on_ms,
            poll_ms,
            gap_ticks: (settings.blink_gap_ms / poll_ms).max(1),
            position: 0,
        }
    }

    fn cycle_len(&self) -> u32 {
        2 * self.blinks + self.gap_ticks
    }

    pub fn next_tick(&mut self) -> Tick {
        let position = self.position;
        self.position = (self.position + 1) % self.cycle_len();

        if position < 2 * self.blinks {
            if position % 2 == 0 {
                Tick {
                    red: Some(true),
                    sleep_ms: self.on_ms,
                }
            } else {
                Tick {
                    red: Some(false),
                    sleep_ms: self.poll_ms,
                }
            }
        } else {
            Tick {
                red: None,
                sleep_ms: self.poll_ms,
            }
        }
    }
}
impl Iterator for BlinkSchedule {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        Some(self.next_tick())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ON: Tick = Tick {
        red: Some(true),
        sleep_ms: 100,
    };
    const OFF: Tick = Tick {
        red: Some(false),
        sleep_ms: 100,
    };
    const GAP: Tick = Tick {
        red: None,
        sleep_ms: 100,
    };

    #[test]
    fn one_cycle_blinks_then_waits() {
        let ticks: Vec<Tick> = BlinkSchedule::new(&Settings::default(), 2).take(13).collect();
        let mut expected = vec![ON, OFF, ON, OFF];
        expected.extend(std::iter::repeat(GAP).take(9));
        assert_eq!(ticks, expected);
    }

    #[test]
    fn cycles_repeat_forever() {
        let mut schedule = BlinkSchedule::new(&Settings::default(), 3);
        let first: Vec<Tick> = schedule.by_ref().take(15).collect();
        let second: Vec<Tick> = schedule.take(15).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn cycle_lasts_blink_time_plus_gap() {
        let settings = Settings::default();
        let total: u32 = BlinkSchedule::new(&settings, 4)
            .take(2 * 4 + 9)
            .map(|t| t.sleep_ms)
            .sum();
        assert_eq!(total, 4 * 200 + 900);
    }

    #[test]
    fn zero_blinks_only_waits() {
        let ticks: Vec<Tick> = BlinkSchedule::new(&Settings::default(), 0).take(20).collect();
        assert!(ticks.iter().all(|t| *t == GAP));
    }
}

use std::time::Duration;

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 700;
pub const DEFAULT_TIMER_HZ: u32 = 60;

/// Switches for the places where CHIP-8 interpreters historically disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 5xy0 compares Vx with itself, so it always skips. This is how the
    /// reference semantics behave; turn it off to compare Vx with Vy.
    pub self_compare_skip: bool,
    /// 8xy6 and 8xyE shift Vy into Vx (COSMAC VIP) instead of shifting Vx
    pub shift_reads_vy: bool,
    /// Fx55 and Fx65 leave I pointing past the last register touched
    pub load_store_bumps_index: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            self_compare_skip: true,
            shift_reads_vy: false,
            load_store_bumps_index: false,
        }
    }
}

/// How the host should run a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub instructions_per_second: u32,
    /// frame rate; timers tick once per frame
    pub timer_hz: u32,
    /// fixed seed for the random source, otherwise seeded from the clock
    pub seed: Option<u64>,
    /// stop after this many frames
    pub max_frames: Option<u64>,
    pub quirks: Quirks,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: DEFAULT_INSTRUCTIONS_PER_SECOND,
            timer_hz: DEFAULT_TIMER_HZ,
            seed: None,
            max_frames: None,
            quirks: Quirks::default(),
        }
    }
}

impl Config {
    /// instructions to run between two timer ticks; always at least one
    pub fn cycles_per_frame(&self) -> u32 {
        (self.instructions_per_second / self.timer_hz.max(1)).max(1)
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.timer_hz.max(1) as f64)
    }
}

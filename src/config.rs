/// Persistent level longer than this starts a new cycle (the missing 59th pulse).
pub const GAP_THRESHOLD_US: u64 = 1_200_000;
/// Every pulse at least this long is interpreted as a 1.
pub const BIT_THRESHOLD_US: u64 = 140_000;
/// If no edge is seen for this long, reception has stalled.
pub const WATCHDOG_TIMEOUT_US: u64 = 2_500_000;
/// Number of bits in a cycle.
pub const CYCLE_LENGTH: usize = 59;

/// Timing parameters of the pulse decoder, all durations in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub gap_threshold_us: u64,
    pub bit_threshold_us: u64,
    pub watchdog_timeout_us: u64,
    pub cycle_length: usize,
}

impl DecoderConfig {
    pub const DEFAULT: Self = Self {
        gap_threshold_us: GAP_THRESHOLD_US,
        bit_threshold_us: BIT_THRESHOLD_US,
        watchdog_timeout_us: WATCHDOG_TIMEOUT_US,
        cycle_length: CYCLE_LENGTH,
    };

    pub const fn with_gap_threshold_us(mut self, us: u64) -> Self {
        self.gap_threshold_us = us;
        self
    }

    pub const fn with_bit_threshold_us(mut self, us: u64) -> Self {
        self.bit_threshold_us = us;
        self
    }

    pub const fn with_watchdog_timeout_us(mut self, us: u64) -> Self {
        self.watchdog_timeout_us = us;
        self
    }

    /// Frames never hold more than 59 bits, larger values are clamped.
    pub const fn with_cycle_length(mut self, bits: usize) -> Self {
        self.cycle_length = if bits > CYCLE_LENGTH { CYCLE_LENGTH } else { bits };
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

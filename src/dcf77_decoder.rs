use crate::config::DecoderConfig;
use crate::datetime_converter::{CalendarTime, DCF77DateTimeConverter};
use crate::error::DecodeError;
use crate::frame::Frame;

/// Line level after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a falling edge to start measuring a gap.
    Idle,
    /// Measuring the gap, a long one marks the start of a minute.
    Armed,
    /// Collecting pulse widths into the working frame.
    Receiving,
}

/// Counters for edges and cycles that do not surface as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Edges that did not match the current phase and were dropped.
    pub ignored_edges: u32,
    /// Gaps too short to be a minute mark.
    pub rejected_gaps: u32,
    pub frames_completed: u32,
    pub watchdog_resets: u32,
}

/// Edge driven DCF77 pulse decoder.
///
/// Feed every transition of the receiver output to [`DCF77Decoder::on_edge`]
/// together with a monotonic microsecond timestamp. The line is high while the
/// carrier is reduced, so a pulse lasts from a rising to the next falling edge.
pub struct DCF77Decoder {
    config: DecoderConfig,
    phase: Phase,
    edge_start: u64,
    edge_stop: u64,
    last_edge: Option<u64>,
    current_bits: Frame,
    last_bits: Option<Frame>,
    bit_pos: usize,
    diagnostics: Diagnostics,
}

impl Default for DCF77Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DCF77Decoder {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::DEFAULT)
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            edge_start: 0,
            edge_stop: 0,
            last_edge: None,
            current_bits: Frame::EMPTY,
            last_bits: None,
            bit_pos: 0,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bit_pos(&self) -> usize {
        self.bit_pos
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Frame being filled by the current cycle.
    pub fn working_frame(&self) -> Frame {
        self.current_bits
    }

    /// Last complete frame, `None` before the first minute mark or after a
    /// watchdog reset.
    pub fn last_bits(&self) -> Option<Frame> {
        self.last_bits
    }

    pub fn reset_last_bits(&mut self) {
        self.last_bits.take();
    }

    /// Single entry point for level transitions.
    pub fn on_edge(&mut self, level: Level, now: u64) {
        self.check_watchdog(now);
        self.last_edge = Some(now);

        match (self.phase, level) {
            (Phase::Idle, Level::Low) => {
                self.edge_start = now;
                self.phase = Phase::Armed;
            }
            (Phase::Armed, Level::High) => {
                self.edge_stop = now;
                let gap = self.edge_stop.wrapping_sub(self.edge_start);
                if gap > self.config.gap_threshold_us {
                    rprintln!("Minute mark, gap {} us", gap);
                    self.current_bits.clear();
                    self.bit_pos = 0;
                    // this rising edge opens the window of pulse 0
                    self.edge_start = now;
                    self.phase = Phase::Receiving;
                } else {
                    self.diagnostics.rejected_gaps = self.diagnostics.rejected_gaps.wrapping_add(1);
                    self.phase = Phase::Idle;
                }
            }
            (Phase::Receiving, Level::High) => {
                self.edge_start = now;
            }
            (Phase::Receiving, Level::Low) => {
                self.edge_stop = now;
                let width = self.edge_stop.wrapping_sub(self.edge_start);
                self.add_second(width >= self.config.bit_threshold_us);
                if self.bit_pos >= self.config.cycle_length {
                    self.add_minute();
                    self.edge_start = now;
                    self.phase = Phase::Armed;
                }
            }
            (Phase::Idle, Level::High) | (Phase::Armed, Level::Low) => {
                self.diagnostics.ignored_edges = self.diagnostics.ignored_edges.wrapping_add(1);
            }
        }
    }

    /// Invalidates the last frame when no edge was seen for longer than the
    /// watchdog timeout, and abandons a cycle in progress. Returns whether a
    /// reset happened.
    ///
    /// An armed decoder keeps measuring its gap: a silence of any length
    /// longer than the gap threshold is still a minute mark.
    pub fn check_watchdog(&mut self, now: u64) -> bool {
        let last_edge = match self.last_edge {
            Some(t) => t,
            None => return false,
        };
        if now.wrapping_sub(last_edge) <= self.config.watchdog_timeout_us {
            return false;
        }
        rprintln!("Watchdog: no edge for {} us", now.wrapping_sub(last_edge));
        if self.phase == Phase::Receiving {
            self.phase = Phase::Idle;
            self.bit_pos = 0;
        }
        self.last_bits = None;
        self.last_edge = None;
        self.diagnostics.watchdog_resets = self.diagnostics.watchdog_resets.wrapping_add(1);
        true
    }

    /// Decodes the last complete frame.
    pub fn decode(&self) -> Result<CalendarTime, DecodeError> {
        let frame = self.last_bits.ok_or(DecodeError::StaleFrame)?;
        DCF77DateTimeConverter::new(frame).dcf77_decoder()
    }

    fn add_minute(&mut self) {
        self.last_bits.replace(self.current_bits);
        rprintln!("Minute complete: {:059b}", self.current_bits);
        self.bit_pos = 0;
        self.diagnostics.frames_completed = self.diagnostics.frames_completed.wrapping_add(1);
    }

    fn add_second(&mut self, bit: bool) {
        self.current_bits.set_bit(self.bit_pos as u32, bit);
        self.bit_pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000;

    /// Decoder that just saw a long gap and is collecting bits.
    fn receiving_at(t: u64) -> DCF77Decoder {
        let mut decoder = DCF77Decoder::new();
        decoder.on_edge(Level::Low, t);
        decoder.on_edge(Level::High, t + 1_900 * MS);
        assert_eq!(decoder.phase(), Phase::Receiving);
        decoder
    }

    #[test]
    fn falling_edge_arms_from_idle() {
        let mut decoder = DCF77Decoder::new();
        decoder.on_edge(Level::Low, 10);
        assert_eq!(decoder.phase(), Phase::Armed);
    }

    #[test]
    fn rising_edge_is_ignored_in_idle() {
        let mut decoder = DCF77Decoder::new();
        decoder.on_edge(Level::High, 10);
        assert_eq!(decoder.phase(), Phase::Idle);
        assert_eq!(decoder.diagnostics().ignored_edges, 1);
    }

    #[test]
    fn falling_edge_is_ignored_when_armed() {
        let mut decoder = DCF77Decoder::new();
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::Low, 500 * MS);
        assert_eq!(decoder.phase(), Phase::Armed);
        assert_eq!(decoder.diagnostics().ignored_edges, 1);
        // the gap is still measured from the first falling edge
        decoder.on_edge(Level::High, 1_300 * MS);
        assert_eq!(decoder.phase(), Phase::Receiving);
    }

    #[test]
    fn gap_at_threshold_returns_to_idle() {
        let before = Frame::from_bits(0b111);
        let mut decoder = DCF77Decoder::new();
        decoder.current_bits = before;
        decoder.bit_pos = 3;
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 1_200 * MS);
        assert_eq!(decoder.phase(), Phase::Idle);
        assert_eq!(decoder.working_frame(), before);
        assert_eq!(decoder.bit_pos(), 3);
        assert_eq!(decoder.diagnostics().rejected_gaps, 1);
    }

    #[test]
    fn gap_above_threshold_starts_cycle() {
        let mut decoder = DCF77Decoder::new();
        decoder.current_bits = Frame::from_bits(0xFF);
        decoder.bit_pos = 8;
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 1_200 * MS + 1);
        assert_eq!(decoder.phase(), Phase::Receiving);
        assert_eq!(decoder.working_frame(), Frame::EMPTY);
        assert_eq!(decoder.bit_pos(), 0);
    }

    #[test]
    fn bit_threshold_is_inclusive() {
        let mut decoder = receiving_at(0);
        let t = decoder.edge_start;
        decoder.on_edge(Level::Low, t + 140 * MS);
        decoder.on_edge(Level::High, t + 1_000 * MS);
        decoder.on_edge(Level::Low, t + 1_140 * MS - 1);
        assert!(decoder.working_frame().bit(0));
        assert!(!decoder.working_frame().bit(1));
        assert_eq!(decoder.bit_pos(), 2);
    }

    #[test]
    fn rising_edge_restarts_pulse_window() {
        let mut decoder = receiving_at(0);
        let t = decoder.edge_start;
        decoder.on_edge(Level::High, t + 50 * MS);
        decoder.on_edge(Level::Low, t + 150 * MS);
        assert!(!decoder.working_frame().bit(0));
    }

    #[test]
    fn full_cycle_freezes_frame() {
        let mut decoder = receiving_at(0);
        let mut expected = Frame::EMPTY;
        let mut t = decoder.edge_start;
        for i in 0..59u32 {
            let one = i % 3 == 0;
            expected.set_bit(i, one);
            if i > 0 {
                decoder.on_edge(Level::High, t);
            }
            let width = if one { 200 * MS } else { 100 * MS };
            decoder.on_edge(Level::Low, t + width);
            t += 1_000 * MS;
        }
        assert_eq!(decoder.bit_pos(), 0);
        assert_eq!(decoder.phase(), Phase::Armed);
        assert_eq!(decoder.last_bits(), Some(expected));
        assert_eq!(decoder.diagnostics().frames_completed, 1);
    }

    #[test]
    fn decode_without_frame_is_stale() {
        let decoder = DCF77Decoder::new();
        assert_eq!(decoder.decode(), Err(DecodeError::StaleFrame));
    }

    #[test]
    fn watchdog_invalidates_frame() {
        let mut decoder = receiving_at(0);
        decoder.last_bits = Some(Frame::from_bits(1));
        let last = decoder.edge_start;
        assert!(!decoder.check_watchdog(last + 2_500 * MS));
        assert!(decoder.check_watchdog(last + 2_500 * MS + 1));
        assert_eq!(decoder.phase(), Phase::Idle);
        assert_eq!(decoder.last_bits(), None);
        assert_eq!(decoder.decode(), Err(DecodeError::StaleFrame));
        assert_eq!(decoder.diagnostics().watchdog_resets, 1);
        // nothing left to time out
        assert!(!decoder.check_watchdog(last + 10_000 * MS));
    }

    #[test]
    fn late_edge_is_handled_from_idle() {
        let mut decoder = receiving_at(0);
        let last = decoder.edge_start;
        decoder.on_edge(Level::Low, last + 3_000 * MS);
        assert_eq!(decoder.phase(), Phase::Armed);
        assert_eq!(decoder.bit_pos(), 0);
        assert_eq!(decoder.diagnostics().watchdog_resets, 1);
    }

    #[test]
    fn watchdog_keeps_armed_gap() {
        let mut decoder = DCF77Decoder::new();
        decoder.last_bits = Some(Frame::from_bits(1));
        decoder.on_edge(Level::Low, 0);
        assert!(decoder.check_watchdog(2_600 * MS));
        assert_eq!(decoder.phase(), Phase::Armed);
        assert_eq!(decoder.last_bits(), None);
        // gap of three seconds, the pulse before the minute mark was lost
        decoder.on_edge(Level::High, 3_000 * MS);
        assert_eq!(decoder.phase(), Phase::Receiving);
        assert_eq!(decoder.bit_pos(), 0);
        assert_eq!(decoder.diagnostics().watchdog_resets, 1);
    }

    #[test]
    fn long_silence_while_armed_ends_in_minute_mark() {
        let mut decoder = DCF77Decoder::new();
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 3_000 * MS);
        assert_eq!(decoder.phase(), Phase::Receiving);
        assert_eq!(decoder.diagnostics().watchdog_resets, 1);
        assert_eq!(decoder.diagnostics().rejected_gaps, 0);
    }

    #[test]
    fn custom_bit_threshold() {
        let config = DecoderConfig::DEFAULT.with_bit_threshold_us(150 * MS);
        let mut decoder = DCF77Decoder::with_config(config);
        assert_eq!(decoder.config().bit_threshold_us, 150 * MS);
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 1_900 * MS);
        decoder.on_edge(Level::Low, 2_045 * MS);
        decoder.on_edge(Level::High, 2_900 * MS);
        decoder.on_edge(Level::Low, 3_050 * MS);
        assert!(!decoder.working_frame().bit(0));
        assert!(decoder.working_frame().bit(1));
    }

    #[test]
    fn custom_gap_threshold() {
        let config = DecoderConfig::DEFAULT.with_gap_threshold_us(800 * MS);
        let mut decoder = DCF77Decoder::with_config(config);
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 900 * MS);
        assert_eq!(decoder.phase(), Phase::Receiving);

        let mut decoder = DCF77Decoder::new();
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 900 * MS);
        assert_eq!(decoder.phase(), Phase::Idle);
    }

    #[test]
    fn custom_watchdog_timeout() {
        let config = DecoderConfig::DEFAULT.with_watchdog_timeout_us(1_000 * MS);
        let mut decoder = DCF77Decoder::with_config(config);
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 1_900 * MS);
        assert_eq!(decoder.phase(), Phase::Receiving);
        decoder.last_bits = Some(Frame::from_bits(1));
        assert!(!decoder.check_watchdog(2_900 * MS));
        assert!(decoder.check_watchdog(2_900 * MS + 1));
        assert_eq!(decoder.phase(), Phase::Idle);
        assert_eq!(decoder.decode(), Err(DecodeError::StaleFrame));
    }

    #[test]
    fn short_cycle_length() {
        let config = DecoderConfig::DEFAULT.with_cycle_length(2);
        let mut decoder = DCF77Decoder::with_config(config);
        decoder.on_edge(Level::Low, 0);
        decoder.on_edge(Level::High, 1_900 * MS);
        decoder.on_edge(Level::Low, 2_000 * MS);
        decoder.on_edge(Level::High, 2_900 * MS);
        decoder.on_edge(Level::Low, 3_100 * MS);
        assert_eq!(decoder.phase(), Phase::Armed);
        assert_eq!(decoder.last_bits(), Some(Frame::from_bits(0b10)));
    }

    #[test]
    fn wrapping_timestamps() {
        let mut decoder = DCF77Decoder::new();
        let start = u64::MAX - 500 * MS;
        decoder.on_edge(Level::Low, start);
        decoder.on_edge(Level::High, start.wrapping_add(1_900 * MS));
        assert_eq!(decoder.phase(), Phase::Receiving);
    }
}

//! Bit-level access to one captured minute of the DCF77 signal.
//!
//! Bit 0 is the first bit received after the minute mark. Fields are addressed
//! by [`BitRange`] so the layout does not depend on compiler bit-field packing.

/// A contiguous run of bits inside a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub shift: u32,
    pub width: u32,
}

impl BitRange {
    pub const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    /// Bits at or above 64 are not part of any mask.
    pub const fn mask(&self) -> u64 {
        let ones = match 1u64.checked_shl(self.width) {
            Some(bit) => bit - 1,
            None => u64::MAX,
        };
        match ones.checked_shl(self.shift) {
            Some(mask) => mask,
            None => 0,
        }
    }

    pub const fn end(&self) -> u32 {
        self.shift.saturating_add(self.width)
    }
}

pub const START_OF_MINUTE: u32 = 0;
pub const CIVIL_WARNING: BitRange = BitRange::new(1, 14);
pub const CALL_BIT: u32 = 15;
pub const DST_ANNOUNCEMENT: u32 = 16;
pub const CEST: u32 = 17;
pub const CET: u32 = 18;
pub const LEAP_SECOND_ANNOUNCEMENT: u32 = 19;
pub const START_OF_TIME: u32 = 20;

pub const MINUTE_UNITS: BitRange = BitRange::new(21, 4);
pub const MINUTE_TENS: BitRange = BitRange::new(25, 3);
pub const MINUTE: BitRange = BitRange::new(21, 7);
pub const MINUTE_PARITY: u32 = 28;

pub const HOUR_UNITS: BitRange = BitRange::new(29, 4);
pub const HOUR_TENS: BitRange = BitRange::new(33, 2);
pub const HOUR: BitRange = BitRange::new(29, 6);
pub const HOUR_PARITY: u32 = 35;

pub const DAY_UNITS: BitRange = BitRange::new(36, 4);
pub const DAY_TENS: BitRange = BitRange::new(40, 2);
pub const WEEKDAY: BitRange = BitRange::new(42, 3);
pub const MONTH_UNITS: BitRange = BitRange::new(45, 4);
pub const MONTH_TENS: BitRange = BitRange::new(49, 1);
pub const YEAR_UNITS: BitRange = BitRange::new(50, 4);
pub const YEAR_TENS: BitRange = BitRange::new(54, 4);
pub const DATE: BitRange = BitRange::new(36, 22);
pub const DATE_PARITY: u32 = 58;

/// Width of a full frame.
pub const FRAME_BITS: u32 = 59;

/// One 59 bit DCF77 frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Frame(u64);

impl Frame {
    pub const EMPTY: Self = Self(0);

    /// Bits above [`FRAME_BITS`] are discarded.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits & ((1u64 << FRAME_BITS) - 1))
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub const fn bit(&self, pos: u32) -> bool {
        pos < FRAME_BITS && (self.0 >> pos) & 1 == 1
    }

    pub fn set_bit(&mut self, pos: u32, value: bool) {
        if pos >= FRAME_BITS {
            return;
        }
        if value {
            self.0 |= 1 << pos;
        } else {
            self.0 &= !(1 << pos);
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Unsigned value of `range`, right aligned.
    pub const fn bits(&self, range: BitRange) -> u64 {
        match (self.0 & range.mask()).checked_shr(range.shift) {
            Some(value) => value,
            None => 0,
        }
    }

    /// Tens digit times ten plus units digit.
    pub const fn bcd(&self, units: BitRange, tens: BitRange) -> u8 {
        self.bits(tens).wrapping_mul(10).wrapping_add(self.bits(units)) as u8
    }

    /// Even parity of `range`: true when the number of set bits is odd, i.e.
    /// the value the parity bit must carry.
    pub const fn parity(&self, range: BitRange) -> bool {
        self.bits(range).count_ones() % 2 == 1
    }

    pub const fn start_of_time(&self) -> bool {
        self.bit(START_OF_TIME)
    }

    pub const fn civil_warning(&self) -> u16 {
        self.bits(CIVIL_WARNING) as u16
    }

    pub const fn leap_second_announced(&self) -> bool {
        self.bit(LEAP_SECOND_ANNOUNCEMENT)
    }

    pub const fn dst_change_announced(&self) -> bool {
        self.bit(DST_ANNOUNCEMENT)
    }

    /// CEST flagged and CET not flagged.
    pub const fn is_dst(&self) -> bool {
        self.bit(CEST) && !self.bit(CET)
    }
}

impl From<u64> for Frame {
    fn from(bits: u64) -> Self {
        Self::from_bits(bits)
    }
}

impl From<Frame> for u64 {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

impl core::fmt::Binary for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Binary::fmt(&self.0, f)
    }
}

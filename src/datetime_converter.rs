use chrono::naive::{NaiveDate, NaiveDateTime};

use crate::error::{DecodeError, FrameField};
use crate::frame::{
    self, Frame, DATE, DATE_PARITY, DAY_TENS, DAY_UNITS, HOUR, HOUR_PARITY, HOUR_TENS, HOUR_UNITS,
    MINUTE, MINUTE_PARITY, MINUTE_TENS, MINUTE_UNITS, MONTH_TENS, MONTH_UNITS, WEEKDAY, YEAR_TENS,
    YEAR_UNITS,
};

/// Two digit years are counted from here.
pub const CENTURY: u16 = 2000;

/// Civil time carried by one frame. Seconds are always zero: the frame
/// describes the minute that starts at the following minute mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    /// 1 is Monday, 7 is Sunday.
    pub weekday: u8,
    pub month: u8,
    pub year: u16,
    pub is_dst: bool,
}

impl CalendarTime {
    /// `None` if the fields do not name a real date and time.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, 0)
    }
}

pub struct DCF77DateTimeConverter {
    frame: Frame,
}

impl DCF77DateTimeConverter {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    /// Validates the minute, hour and date parity bits, in that order, and
    /// returns the decoded fields only when all three match.
    pub fn dcf77_decoder(&self) -> Result<CalendarTime, DecodeError> {
        let frame = &self.frame;
        let is_dst = frame.is_dst();

        let minute = frame.bcd(MINUTE_UNITS, MINUTE_TENS);
        check_parity(frame, MINUTE, MINUTE_PARITY, FrameField::Minute)?;

        let hour = frame.bcd(HOUR_UNITS, HOUR_TENS);
        check_parity(frame, HOUR, HOUR_PARITY, FrameField::Hour)?;

        let day = frame.bcd(DAY_UNITS, DAY_TENS);
        let weekday = frame.bits(WEEKDAY) as u8;
        let month = frame.bcd(MONTH_UNITS, MONTH_TENS);
        let year = frame.bcd(YEAR_UNITS, YEAR_TENS);
        check_parity(frame, DATE, DATE_PARITY, FrameField::Date)?;

        Ok(CalendarTime {
            minute,
            hour,
            day,
            weekday,
            month,
            year: CENTURY + year as u16,
            is_dst,
        })
    }

    /// Builds the frame a transmitter would send for `time`, with the start of
    /// time marker, the CEST/CET flags and all three parity bits set.
    pub fn encode(time: &CalendarTime) -> Frame {
        let mut frame = Frame::EMPTY;
        let year = time.year.saturating_sub(CENTURY) % 100;
        put_bcd(&mut frame, MINUTE_UNITS, MINUTE_TENS, time.minute);
        put_bcd(&mut frame, HOUR_UNITS, HOUR_TENS, time.hour);
        put_bcd(&mut frame, DAY_UNITS, DAY_TENS, time.day);
        put(&mut frame, WEEKDAY, time.weekday as u64);
        put_bcd(&mut frame, MONTH_UNITS, MONTH_TENS, time.month);
        put_bcd(&mut frame, YEAR_UNITS, YEAR_TENS, year as u8);

        frame.set_bit(frame::START_OF_TIME, true);
        frame.set_bit(frame::CEST, time.is_dst);
        frame.set_bit(frame::CET, !time.is_dst);
        frame.set_bit(MINUTE_PARITY, frame.parity(MINUTE));
        frame.set_bit(HOUR_PARITY, frame.parity(HOUR));
        frame.set_bit(DATE_PARITY, frame.parity(DATE));
        frame
    }
}

fn check_parity(
    frame: &Frame,
    range: frame::BitRange,
    parity_bit: u32,
    field: FrameField,
) -> Result<(), DecodeError> {
    if frame.parity(range) != frame.bit(parity_bit) {
        return Err(DecodeError::Checksum { field });
    }
    Ok(())
}

fn put(frame: &mut Frame, range: frame::BitRange, value: u64) {
    for i in 0..range.width {
        frame.set_bit(range.shift + i, (value >> i) & 1 == 1);
    }
}

fn put_bcd(frame: &mut Frame, units: frame::BitRange, tens: frame::BitRange, value: u8) {
    put(frame, units, (value % 10) as u64);
    put(frame, tens, (value / 10) as u64);
}

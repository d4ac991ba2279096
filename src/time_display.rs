use crate::SegmentDisplay;
use adafruit_7segment::{AsciiChar, Index, SevenSegment};
use stm32f4xx_hal::i2c;

#[derive(Debug)]
pub enum DisplayError {
    /// The I2C write of the display buffer failed.
    Bus(i2c::Error),
    /// A character with no 7-segment representation.
    Glyph,
}

/// Receiver state shown in the decimal points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusDots {
    /// A minute is being received, rightmost dot.
    pub receiving: bool,
    /// The last decode succeeded, third dot.
    pub decoded: bool,
}

pub struct SegmentDisplayAdapter {
    display: SegmentDisplay,
}

impl SegmentDisplayAdapter {
    pub fn new(display: SegmentDisplay) -> Self {
        Self { display }
    }

    pub fn display_time(
        &mut self,
        hours: u8,
        minutes: u8,
        status: StatusDots,
    ) -> Result<(), DisplayError> {
        let digits = [hours / 10, hours % 10, minutes / 10, minutes % 10];
        for (index, digit) in DIGITS.into_iter().zip(digits) {
            self.display.update_buffer_with_digit(index, digit);
        }
        self.show_status(status);
        self.flush()
    }

    /// Four dashes, shown until the RTC was synchronized once.
    pub fn display_unsynchronized(&mut self, status: StatusDots) -> Result<(), DisplayError> {
        for index in DIGITS {
            self.display
                .update_buffer_with_char(index, AsciiChar::Minus)
                .map_err(|_| DisplayError::Glyph)?;
        }
        self.show_status(status);
        self.display.update_buffer_with_colon(false);
        self.flush()
    }

    pub fn blink_second(&mut self, on_state: bool) -> Result<(), DisplayError> {
        self.display.update_buffer_with_colon(on_state);
        self.flush()
    }

    fn show_status(&mut self, status: StatusDots) {
        self.display.update_buffer_with_dot(Index::One, false);
        self.display.update_buffer_with_dot(Index::Two, false);
        self.display.update_buffer_with_dot(Index::Three, status.decoded);
        self.display.update_buffer_with_dot(Index::Four, status.receiving);
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.display.write_display_buffer().map_err(DisplayError::Bus)
    }
}

const DIGITS: [Index; 4] = [Index::One, Index::Two, Index::Three, Index::Four];

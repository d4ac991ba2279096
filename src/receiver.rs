//! Binds the decoder to a digital input and a microsecond clock.
//!
//! The interrupt layer is expected to call
//! [`Dcf77Receiver::on_edge_interrupt`] on every rising and falling edge of
//! the receiver output, while application code calls
//! [`Dcf77Receiver::decode`] whenever it wants the current time.

use embedded_hal::digital::InputPin;

use crate::config::DecoderConfig;
use crate::datetime_converter::CalendarTime;
use crate::dcf77_decoder::{DCF77Decoder, Diagnostics, Level};
use crate::error::DecodeError;

/// Monotonic microsecond time source.
///
/// Takes `&mut self` so implementations can widen a wrapping hardware counter.
pub trait MonotonicClock {
    fn now_us(&mut self) -> u64;
}

impl<F: FnMut() -> u64> MonotonicClock for F {
    fn now_us(&mut self) -> u64 {
        self()
    }
}

pub struct Dcf77Receiver<P, C> {
    pin: P,
    clock: C,
    decoder: DCF77Decoder,
}

impl<P: InputPin, C: MonotonicClock> Dcf77Receiver<P, C> {
    pub fn new(pin: P, clock: C) -> Self {
        Self::with_config(pin, clock, DecoderConfig::DEFAULT)
    }

    pub fn with_config(pin: P, clock: C, config: DecoderConfig) -> Self {
        Self {
            pin,
            clock,
            decoder: DCF77Decoder::with_config(config),
        }
    }

    /// Edge interrupt handler. The level is sampled before the timestamp so a
    /// slow pin read never shortens the measured interval.
    ///
    /// # Errors
    /// Returns the pin error and leaves the decoder untouched if the line
    /// level cannot be read.
    pub fn on_edge_interrupt(&mut self) -> Result<(), P::Error> {
        let level = Level::from(self.pin.is_high()?);
        let now = self.clock.now_us();
        self.decoder.on_edge(level, now);
        Ok(())
    }

    /// Runs the watchdog, then decodes the last complete frame.
    pub fn decode(&mut self) -> Result<CalendarTime, DecodeError> {
        let now = self.clock.now_us();
        self.decoder.check_watchdog(now);
        let result = self.decoder.decode();
        if let Err(DecodeError::Checksum { field }) = result {
            rprintln!("Decoding error: {} parity", field);
        }
        result
    }

    pub fn decoder(&self) -> &DCF77Decoder {
        &self.decoder
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.decoder.diagnostics()
    }

    /// Access to the pin, e.g. to clear its interrupt flag.
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    pub fn release(self) -> (P, C) {
        (self.pin, self.clock)
    }
}

//! Edge triggered DCF77 time signal decoder.
//!
//! [`DCF77Decoder`] turns rising/falling transitions of a DCF77 receiver
//! output, timestamped in microseconds, into 59 bit frames.
//! [`DCF77DateTimeConverter`] checks the three parity bits of a frame and
//! extracts the broadcast civil time. [`Dcf77Receiver`] ties both to an
//! `embedded-hal` input pin and a [`MonotonicClock`].
#![cfg_attr(not(test), no_std)]

/// Logs to the RTT channel on the board, only formats its arguments otherwise.
macro_rules! rprintln {
    ($($arg:tt)*) => {{
        #[cfg(feature = "firmware")]
        rtt_target::rprintln!($($arg)*);
        #[cfg(not(feature = "firmware"))]
        let _ = format_args!($($arg)*);
    }};
}

pub mod config;
pub mod datetime_converter;
pub mod dcf77_decoder;
pub mod error;
pub mod frame;
pub mod receiver;

pub use config::DecoderConfig;
pub use datetime_converter::{CalendarTime, DCF77DateTimeConverter};
pub use dcf77_decoder::{DCF77Decoder, Diagnostics, Level, Phase};
pub use error::{DecodeError, FrameField};
pub use frame::Frame;
pub use receiver::{Dcf77Receiver, MonotonicClock};

use thiserror::Error;

/// The parity-protected fields of a frame, in checking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    Minute,
    Hour,
    Date,
}

impl core::fmt::Display for FrameField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            FrameField::Minute => "minute",
            FrameField::Hour => "hour",
            FrameField::Date => "date",
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Recomputed parity of `field` does not match its parity bit.
    #[error("Parity check failed for the {field} field.")]
    Checksum { field: FrameField },

    /// No frame captured yet, or the watchdog dropped the last one.
    #[error("No valid frame has been captured.")]
    StaleFrame,
}

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdacError {
    InvalidInput(&'static str),
    SyncMismatch { found: u8 },
    InvalidHeader(&'static str),
    InvalidCode { bit_pos: usize },
    InvalidPrecision { unit: usize, precision: i32 },
    InvalidScaleFactor { unit: usize, value: i32 },
    UnexpectedEof { needed: usize, available: usize },
    FrameOverrun { bit_pos: usize, frame_bits: usize },
    OutputTooSmall { needed: usize, available: usize },
}

impl LdacError {
    /// `true` when more input bytes could turn this error into a successful decode.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, LdacError::UnexpectedEof { .. })
    }
}

impl fmt::Display for LdacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LdacError::InvalidInput(s) => write!(f, "invalid input: {s}"),
            LdacError::SyncMismatch { found } => {
                write!(f, "sync byte mismatch: expected 0xaa, found {found:#04x}")
            }
            LdacError::InvalidHeader(s) => write!(f, "invalid frame header: {s}"),
            LdacError::InvalidCode { bit_pos } => write!(f, "invalid code at bit {bit_pos}"),
            LdacError::InvalidPrecision { unit, precision } => {
                write!(f, "precision {precision} out of range in quantization unit {unit}")
            }
            LdacError::InvalidScaleFactor { unit, value } => {
                write!(f, "scale factor {value} out of range in quantization unit {unit}")
            }
            LdacError::UnexpectedEof { needed, available } => {
                write!(f, "unexpected end of input: need {needed} bytes, have {available}")
            }
            LdacError::FrameOverrun { bit_pos, frame_bits } => {
                write!(f, "frame data runs to bit {bit_pos}, past the declared {frame_bits} bits")
            }
            LdacError::OutputTooSmall { needed, available } => {
                write!(f, "output buffer too small: need {needed} samples, have {available}")
            }
        }
    }
}

impl std::error::Error for LdacError {}

use bitflags::bitflags;

bitflags! {
    /// Decoder behaviour switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecoderFlags: u32 {
        /// Gradient modes 1..=3 end at unit 31 instead of unit 26.
        ///
        /// Older encoder revisions used this end point; the end value is 31 either way.
        const LEGACY_GRADIENT = 1 << 0;
        /// The streaming [`crate::Decoder`] skips malformed frames by scanning forward to the
        /// next sync byte instead of returning the error.
        const RESYNC          = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderParams {
    /// Decoder flags.
    pub flags: DecoderFlags,
}

impl DecoderParams {
    /// Create a new parameter set.
    pub fn new(flags: DecoderFlags) -> Self {
        Self { flags }
    }

    /// Fixed `(end_unit, end_value)` of the gradient for modes 1..=3.
    pub fn gradient_end(&self) -> (usize, i32) {
        if self.flags.contains(DecoderFlags::LEGACY_GRADIENT) {
            (31, 31)
        } else {
            (26, 31)
        }
    }
}

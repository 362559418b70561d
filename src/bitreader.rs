/// MSB-first bit reader over a byte slice.
///
/// Reads never fail: bits beyond the end of `data` read as zero. Frame decoding bounds the
/// slice to the declared frame size and checks [`BitReader::bits_read`] afterwards, so an
/// over-read surfaces as [`crate::LdacError::FrameOverrun`] instead of a panic.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    pub fn bits_read(&self) -> usize {
        self.bit_pos
    }

    /// Number of bits backed by the underlying slice.
    pub fn bits_total(&self) -> usize {
        self.data.len() * 8
    }

    /// Return the next `nbits` bits (at most 32) without advancing.
    pub fn peek(&self, nbits: u32) -> u32 {
        assert!(nbits <= 32, "peek supports up to 32 bits, got {nbits}");
        if nbits == 0 {
            return 0;
        }

        // 40 bits always cover a 32-bit field starting anywhere inside the first byte.
        let byte_idx = self.bit_pos / 8;
        let mut window: u64 = 0;
        for i in 0..5 {
            let byte = self.data.get(byte_idx + i).copied().unwrap_or(0);
            window = (window << 8) | u64::from(byte);
        }

        let shift = 40 - (self.bit_pos % 8) - nbits as usize;
        ((window >> shift) & ((1u64 << nbits) - 1)) as u32
    }

    pub fn read(&mut self, nbits: u32) -> u32 {
        let value = self.peek(nbits);
        self.bit_pos += nbits as usize;
        value
    }

    pub fn read_bit(&mut self) -> bool {
        self.read(1) != 0
    }

    /// Read `nbits` and sign-extend from bit `nbits - 1`.
    pub fn read_signed(&mut self, nbits: u32) -> i32 {
        sign_extend(self.read(nbits), nbits)
    }

    /// Read an offset-binary field. The offset is applied by the caller.
    pub fn read_offset_binary(&mut self, nbits: u32) -> i32 {
        self.read(nbits) as i32
    }

    pub fn skip(&mut self, nbits: u32) {
        self.bit_pos += nbits as usize;
    }

    /// Advance to the next multiple of `multiple` bits.
    pub fn align(&mut self, multiple: usize) {
        assert!(multiple > 0, "alignment must be non-zero");
        let rem = self.bit_pos % multiple;
        if rem != 0 {
            self.bit_pos += multiple - rem;
        }
    }

    pub fn align_to_byte(&mut self) {
        self.align(8);
    }
}

pub(crate) fn sign_extend(raw: u32, bits: u32) -> i32 {
    if bits == 0 {
        return 0;
    }
    let shift = 32 - bits;
    ((raw << shift) as i32) >> shift
}

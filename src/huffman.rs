//! Prefix codes for scale-factor differences.
//!
//! Every codebook is expanded once into a direct lookup table of `2^max_bit_size` slots, so a
//! symbol costs one peek, one table index and one skip.

use crate::bitreader::{BitReader, sign_extend};
use crate::error::LdacError;

const UNUSED_SLOT: u8 = u8::MAX;

/// Static description of one prefix code.
#[derive(Debug)]
pub struct CodeTable {
    /// Code length per symbol, 0 for symbols the code never emits.
    pub bits: &'static [u8],
    /// Code word per symbol, right-aligned.
    pub codes: &'static [u16],
    /// Width the decoded symbol is sign-extended from.
    pub value_bits: u32,
    /// Longest code length.
    pub max_bit_size: u32,
}

/// A code table expanded into its direct lookup form.
#[derive(Debug, Clone)]
pub struct HuffmanCodebook {
    bits: &'static [u8],
    value_bits: u32,
    max_bit_size: u32,
    lookup: Vec<u8>,
}

impl HuffmanCodebook {
    pub fn new(table: &CodeTable) -> Self {
        debug_assert_eq!(table.bits.len(), table.codes.len());

        let mut lookup = vec![UNUSED_SLOT; 1usize << table.max_bit_size];
        for (symbol, (&bits, &code)) in table.bits.iter().zip(table.codes).enumerate() {
            if bits == 0 {
                continue;
            }
            let unused_bits = table.max_bit_size - u32::from(bits);
            let start = usize::from(code) << unused_bits;
            let end = start + (1usize << unused_bits);
            lookup[start..end].fill(symbol as u8);
        }

        Self {
            bits: table.bits,
            value_bits: table.value_bits,
            max_bit_size: table.max_bit_size,
            lookup,
        }
    }

    pub fn value_bits(&self) -> u32 {
        self.value_bits
    }

    /// Decode one raw symbol index.
    pub fn decode_symbol(&self, br: &mut BitReader<'_>) -> Result<u8, LdacError> {
        let bit_pos = br.bits_read();
        let symbol = self.lookup[br.peek(self.max_bit_size) as usize];
        if symbol == UNUSED_SLOT {
            return Err(LdacError::InvalidCode { bit_pos });
        }
        br.skip(u32::from(self.bits[usize::from(symbol)]));
        Ok(symbol)
    }

    /// Decode one symbol and sign-extend it from `value_bits`.
    pub fn decode_signed(&self, br: &mut BitReader<'_>) -> Result<i32, LdacError> {
        let symbol = self.decode_symbol(br)?;
        Ok(sign_extend(u32::from(symbol), self.value_bits))
    }
}

static SCALE_FACTORS_A3_BITS: [u8; 8] = [2, 2, 4, 6, 6, 5, 3, 2];
static SCALE_FACTORS_A3_CODES: [u16; 8] = [0x00, 0x01, 0x0E, 0x3E, 0x3F, 0x1E, 0x06, 0x02];

static SCALE_FACTORS_A4_BITS: [u8; 16] = [2, 2, 4, 5, 6, 7, 8, 8, 8, 8, 8, 8, 6, 5, 4, 2];
static SCALE_FACTORS_A4_CODES: [u16; 16] = [
    0x01, 0x02, 0x00, 0x06, 0x0F, 0x13, 0x23, 0x24, 0x25, 0x22, 0x21, 0x20, 0x0E, 0x05, 0x01, 0x03,
];

static SCALE_FACTORS_A5_BITS: [u8; 32] = [
    2, 3, 3, 4, 5, 5, 6, 7, 7, 8, 8, 8, 8, 8, 8, 8, //
    8, 8, 8, 8, 8, 8, 8, 8, 8, 7, 7, 6, 5, 5, 4, 3,
];
static SCALE_FACTORS_A5_CODES: [u16; 32] = [
    0x02, 0x01, 0x07, 0x0D, 0x0C, 0x18, 0x1B, 0x21, 0x3F, 0x6A, 0x6B, 0x68, 0x73, 0x79, 0x7C, 0x7D,
    0x7A, 0x7B, 0x78, 0x72, 0x44, 0x45, 0x47, 0x46, 0x69, 0x38, 0x20, 0x1D, 0x19, 0x09, 0x05, 0x00,
];

static SCALE_FACTORS_A6_BITS: [u8; 64] = [
    3, 3, 4, 4, 5, 5, 6, 6, 6, 7, 7, 8, 8, 8, 8, 8, //
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, //
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, //
    8, 8, 8, 8, 8, 7, 7, 7, 6, 6, 5, 5, 5, 4, 4, 4,
];
static SCALE_FACTORS_A6_CODES: [u16; 64] = [
    0x00, 0x01, 0x04, 0x05, 0x12, 0x13, 0x2E, 0x2F, 0x30, 0x66, 0x67, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA,
    0xDB, 0xDC, 0xDD, 0xDE, 0xDF, 0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA,
    0xEB, 0xEC, 0xED, 0xEE, 0xEF, 0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
    0xFB, 0xFC, 0xFD, 0xFE, 0xFF, 0x68, 0x69, 0x6A, 0x31, 0x32, 0x14, 0x15, 0x16, 0x06, 0x07, 0x08,
];

static SCALE_FACTORS_B2_BITS: [u8; 4] = [1, 2, 0, 2];
static SCALE_FACTORS_B2_CODES: [u16; 4] = [0x00, 0x03, 0x00, 0x02];

static SCALE_FACTORS_B3_BITS: [u8; 8] = [1, 3, 5, 6, 0, 6, 4, 2];
static SCALE_FACTORS_B3_CODES: [u16; 8] = [0x01, 0x00, 0x04, 0x0B, 0x00, 0x0A, 0x03, 0x01];

static SCALE_FACTORS_B4_BITS: [u8; 16] = [1, 3, 4, 5, 5, 7, 8, 8, 0, 8, 8, 7, 6, 6, 4, 3];
static SCALE_FACTORS_B4_CODES: [u16; 16] = [
    0x01, 0x01, 0x04, 0x0E, 0x0F, 0x2C, 0x5A, 0x5D, 0x00, 0x5C, 0x5B, 0x2F, 0x15, 0x14, 0x06, 0x00,
];

static SCALE_FACTORS_B5_BITS: [u8; 32] = [
    3, 3, 4, 4, 4, 4, 4, 4, 4, 5, 6, 7, 7, 7, 8, 8, //
    8, 8, 8, 8, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 6, 3,
];
static SCALE_FACTORS_B5_CODES: [u16; 32] = [
    0x00, 0x05, 0x07, 0x0C, 0x04, 0x02, 0x03, 0x05, 0x09, 0x10, 0x23, 0x33, 0x36, 0x6E, 0x60, 0x65,
    0x62, 0x61, 0x63, 0x64, 0x6F, 0x6D, 0x6C, 0x6B, 0x6A, 0x68, 0x69, 0x45, 0x44, 0x37, 0x1A, 0x07,
];

/// Codes for scale-factor differences along the frequency axis, indexed by bit length - 3.
pub static SCALE_FACTOR_UNSIGNED_TABLES: [CodeTable; 4] = [
    CodeTable {
        bits: &SCALE_FACTORS_A3_BITS,
        codes: &SCALE_FACTORS_A3_CODES,
        value_bits: 3,
        max_bit_size: 6,
    },
    CodeTable {
        bits: &SCALE_FACTORS_A4_BITS,
        codes: &SCALE_FACTORS_A4_CODES,
        value_bits: 4,
        max_bit_size: 8,
    },
    CodeTable {
        bits: &SCALE_FACTORS_A5_BITS,
        codes: &SCALE_FACTORS_A5_CODES,
        value_bits: 5,
        max_bit_size: 8,
    },
    CodeTable {
        bits: &SCALE_FACTORS_A6_BITS,
        codes: &SCALE_FACTORS_A6_CODES,
        value_bits: 6,
        max_bit_size: 8,
    },
];

/// Codes for scale-factor differences against the sibling channel, indexed by bit length - 2.
pub static SCALE_FACTOR_SIGNED_TABLES: [CodeTable; 4] = [
    CodeTable {
        bits: &SCALE_FACTORS_B2_BITS,
        codes: &SCALE_FACTORS_B2_CODES,
        value_bits: 2,
        max_bit_size: 2,
    },
    CodeTable {
        bits: &SCALE_FACTORS_B3_BITS,
        codes: &SCALE_FACTORS_B3_CODES,
        value_bits: 3,
        max_bit_size: 6,
    },
    CodeTable {
        bits: &SCALE_FACTORS_B4_BITS,
        codes: &SCALE_FACTORS_B4_CODES,
        value_bits: 4,
        max_bit_size: 8,
    },
    CodeTable {
        bits: &SCALE_FACTORS_B5_BITS,
        codes: &SCALE_FACTORS_B5_CODES,
        value_bits: 5,
        max_bit_size: 8,
    },
];

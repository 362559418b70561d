//! Constant tables of the LDAC format and the process-wide [`CodecTables`].

use std::f64::consts::PI;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::LdacError;
use crate::huffman::{HuffmanCodebook, SCALE_FACTOR_SIGNED_TABLES, SCALE_FACTOR_UNSIGNED_TABLES};
use crate::imdct::ImdctTables;

pub const SYNC_WORD: u8 = 0xaa;
pub const HEADER_BYTES: usize = 3;

pub const MAX_QUANT_UNITS: usize = 34;
pub const MAX_FRAME_SAMPLES: usize = 256;
pub const MAX_BANDS: usize = 16;
pub const MAX_GRADIENT_UNITS: usize = 50;

pub const MIN_PRECISION: i32 = 1;
pub const MAX_PRECISION: i32 = 15;
pub const MAX_SCALE_FACTOR: i32 = 31;

/// Quantization units per band count.
pub static QUANT_UNITS_PER_BANDS: [u8; MAX_BANDS + 1] =
    [0, 4, 8, 10, 12, 14, 16, 18, 20, 22, 24, 25, 26, 28, 30, 32, 34];

/// Spectral lines per quantization unit.
pub static QUANT_UNIT_LINES: [u8; MAX_QUANT_UNITS] = [
    2, 2, 2, 2, 2, 2, 2, 2, //
    4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, //
    8, 8, 8, 8, //
    16, 16, 16, 16, 16, 16, 16, 16, 16, 16,
];

/// First spectral line of each quantization unit, plus the end of the last one.
pub static QUANT_UNIT_START: [u16; MAX_QUANT_UNITS + 1] = [
    0, 2, 4, 6, 8, 10, 12, 14, //
    16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 60, //
    64, 72, 80, 88, //
    96, 112, 128, 144, 160, 176, 192, 208, 224, 240, //
    256,
];

/// Word length in bits per precision.
pub static WORD_LENGTH: [u8; 16] = [0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

/// Scale-factor weighting tables, selected by a 3-bit index.
pub static SCALE_FACTOR_WEIGHTS: [[u8; MAX_QUANT_UNITS]; 8] = [
    [
        1, 0, 0, 1, 1, 1, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, //
        3, 3, 3, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 8,
    ],
    [
        0, 1, 1, 2, 3, 4, 4, 4, 4, 5, 6, 6, 6, 6, 6, 7, //
        7, 7, 7, 7, 7, 7, 8, 8, 8, 9, 10, 10, 11, 11, 12, 12, 12, 12,
    ],
    [
        0, 1, 1, 2, 3, 3, 3, 3, 3, 4, 4, 5, 5, 5, 5, 5, //
        5, 5, 5, 5, 5, 5, 6, 6, 6, 7, 8, 9, 9, 10, 10, 11, 11, 11,
    ],
    [
        0, 1, 3, 4, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7, 7, 7, //
        7, 7, 7, 7, 7, 7, 7, 8, 8, 8, 8, 9, 9, 9, 10, 10, 10, 10,
    ],
    [
        0, 1, 3, 4, 5, 5, 6, 7, 7, 8, 8, 9, 9, 10, 10, 10, //
        10, 11, 11, 11, 11, 11, 11, 12, 12, 12, 12, 12, 12, 13, 13, 13, 13, 13,
    ],
    [
        1, 0, 1, 2, 2, 3, 3, 4, 4, 5, 6, 7, 7, 8, 8, 8, //
        9, 9, 9, 9, 9, 10, 10, 10, 10, 10, 10, 10, 11, 11, 11, 11, 11, 11,
    ],
    [
        0, 0, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, //
        4, 4, 4, 4, 4, 4, 4, 5, 5, 6, 7, 7, 7, 8, 9, 9, 9, 9,
    ],
    [
        0, 0, 1, 2, 3, 4, 4, 5, 5, 6, 7, 7, 8, 8, 8, 8, //
        9, 9, 9, 9, 9, 10, 10, 10, 10, 11, 11, 11, 11, 12, 12, 12, 12, 12,
    ],
];

/// Two 2-bit fields per entry, selected by a 3-bit code.
pub static JOINT_2D_SPECTRUM: [u8; 8] = [0, 1, 2, 4, 6, 8, 9, 10];

/// Four 2-bit fields per entry, selected by a 7-bit code. Codes 81..=127 are never emitted.
pub static JOINT_4D_SPECTRUM: [u8; 81] = [
    0, 1, 2, 4, 5, 6, 8, 9, 10, 16, 17, 18, 20, 21, 22, 24, //
    25, 26, 32, 33, 34, 36, 37, 38, 40, 41, 42, 64, 65, 66, 68, 69, //
    70, 72, 73, 74, 80, 81, 82, 84, 85, 86, 88, 89, 90, 96, 97, 98, //
    100, 101, 102, 104, 105, 106, 128, 129, 130, 132, 133, 134, 136, 137, 138, 144, //
    145, 146, 148, 149, 150, 152, 153, 154, 160, 161, 162, 164, 165, 166, 168, 169, //
    170,
];

/// Inverse quantizer step per precision.
#[allow(clippy::excessive_precision)]
pub static STEP_SIZE: [f32; 16] = [
    2.0000000000000000e+00, 6.6666666666666663e-01, 2.8571428571428570e-01, 1.3333333333333333e-01,
    6.4516129032258063e-02, 3.1746031746031744e-02, 1.5748031496062992e-02, 7.8431372549019607e-03,
    3.9138943248532287e-03, 1.9550342130987292e-03, 9.7703957010258913e-04, 4.8840048840048840e-04,
    2.4417043096081065e-04, 1.2207776353537203e-04, 6.1037018951994385e-05, 3.0518043793392844e-05,
];

/// Inverse quantizer step of the residual refinement, indexed by the coarse precision.
#[allow(clippy::excessive_precision)]
pub static FINE_STEP_SIZE: [f32; 16] = [
    3.0518043793392844e-05, 1.0172681264464281e-05, 4.3597205419132631e-06, 2.0345362528928561e-06,
    9.8445302559331759e-07, 4.8441339354591809e-07, 2.4029955742829012e-07, 1.1967860311134448e-07,
    5.9722199204291275e-08, 2.9831909866464167e-08, 1.4908668194134265e-08, 7.4525137468602791e-09,
    3.7258019525568114e-09, 1.8627872668859698e-09, 9.3136520869755679e-10, 4.6567549848772173e-10,
];

/// `2^(sf - 15)` per scale factor.
pub static SPECTRUM_SCALE: [f64; 32] = [
    3.0517578125e-5, 6.1035156250e-5, 1.2207031250e-4, 2.4414062500e-4,
    4.8828125000e-4, 9.7656250000e-4, 1.9531250000e-3, 3.9062500000e-3,
    7.8125000000e-3, 1.5625000000e-2, 3.1250000000e-2, 6.2500000000e-2,
    1.2500000000e-1, 2.5000000000e-1, 5.0000000000e-1, 1.0000000000e+0,
    2.0000000000e+0, 4.0000000000e+0, 8.0000000000e+0, 1.6000000000e+1,
    3.2000000000e+1, 6.4000000000e+1, 1.2800000000e+2, 2.5600000000e+2,
    5.1200000000e+2, 1.0240000000e+3, 2.0480000000e+3, 4.0960000000e+3,
    8.1920000000e+3, 1.6384000000e+4, 3.2768000000e+4, 6.5536000000e+4,
];

/// Block payload substituted for a lost mono block.
pub static NULL_BLOCK_MONO: [u8; 11] =
    [0x07, 0xa0, 0x16, 0x00, 0x20, 0xad, 0x51, 0x45, 0x14, 0x50, 0x49];

/// Block payload substituted for a lost stereo block.
pub static NULL_BLOCK_STEREO: [u8; 15] = [
    0x07, 0xa0, 0x0a, 0x00, 0x20, 0xad, 0x51, 0x41, 0x24, 0x93, 0x00, 0x28, 0xa0, 0x92, 0x49,
];

/// Gradient interpolation curves. Row `n - 1` spans `n` quantization units and rises from
/// near 0 to near 255.
///
/// The encoder's own table is not bundled. [`GradientCurves::approximate`] stands in with a
/// raised cosine, which decodes frames whose gradient has no ramp exactly and ramped frames
/// only approximately. Load the reference `50 x 50` table with [`GradientCurves::from_table`]
/// or [`GradientCurves::from_bytes`] for bit-exact decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientCurves {
    rows: Vec<Vec<u8>>,
}

impl GradientCurves {
    pub fn approximate() -> Self {
        let rows = (1..=MAX_GRADIENT_UNITS)
            .map(|span| {
                (0..span)
                    .map(|i| {
                        let phase = PI * (i as f64 + 0.5) / span as f64;
                        ((1.0 - phase.cos()) * 128.0).round().min(255.0) as u8
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Take the curves from a square table. Row `n - 1` uses its first `n` entries; the rest is
    /// padding.
    pub fn from_table(table: &[[u8; MAX_GRADIENT_UNITS]; MAX_GRADIENT_UNITS]) -> Self {
        Self::from_rows(table.as_flattened())
    }

    /// Same as [`GradientCurves::from_table`] for the table as 2500 row-major bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LdacError> {
        if bytes.len() != MAX_GRADIENT_UNITS * MAX_GRADIENT_UNITS {
            return Err(LdacError::InvalidInput("gradient curve table must be 50 x 50 bytes"));
        }
        Ok(Self::from_rows(bytes))
    }

    fn from_rows(bytes: &[u8]) -> Self {
        let rows = bytes
            .chunks_exact(MAX_GRADIENT_UNITS)
            .enumerate()
            .map(|(row, values)| values[..=row].to_vec())
            .collect();
        Self { rows }
    }

    /// Curve for a span of `units` quantization units, `1..=50`.
    pub fn for_span(&self, units: usize) -> Option<&[u8]> {
        units.checked_sub(1).and_then(|row| self.rows.get(row)).map(Vec::as_slice)
    }
}

impl Default for GradientCurves {
    fn default() -> Self {
        Self::approximate()
    }
}

/// Read-only tables shared by every decoder: expanded Huffman codebooks, gradient curves and
/// the IMDCT trigonometric, shuffle and window tables.
#[derive(Debug, Clone)]
pub struct CodecTables {
    scale_factor_unsigned: Vec<HuffmanCodebook>,
    scale_factor_signed: Vec<HuffmanCodebook>,
    gradient_curves: GradientCurves,
    imdct: ImdctTables,
}

lazy_static! {
    static ref SHARED_TABLES: Arc<CodecTables> = Arc::new(CodecTables::new());
}

impl CodecTables {
    /// Build a private set of tables with the approximate gradient curves.
    pub fn new() -> Self {
        Self::with_gradient_curves(GradientCurves::approximate())
    }

    /// Build a private set of tables around the given gradient curves.
    pub fn with_gradient_curves(gradient_curves: GradientCurves) -> Self {
        Self {
            scale_factor_unsigned: SCALE_FACTOR_UNSIGNED_TABLES
                .iter()
                .map(HuffmanCodebook::new)
                .collect(),
            scale_factor_signed: SCALE_FACTOR_SIGNED_TABLES
                .iter()
                .map(HuffmanCodebook::new)
                .collect(),
            gradient_curves,
            imdct: ImdctTables::new(),
        }
    }

    /// The process-wide tables, built on first use.
    pub fn shared() -> Arc<CodecTables> {
        Arc::clone(&SHARED_TABLES)
    }

    /// Codebook for frequency-axis differences of `bitlen` bits, `3..=6`.
    pub fn scale_factor_unsigned(&self, bitlen: u32) -> Option<&HuffmanCodebook> {
        (bitlen as usize).checked_sub(3).and_then(|i| self.scale_factor_unsigned.get(i))
    }

    /// Codebook for differences against the sibling channel of `bitlen` bits, `2..=5`.
    pub fn scale_factor_signed(&self, bitlen: u32) -> Option<&HuffmanCodebook> {
        (bitlen as usize).checked_sub(2).and_then(|i| self.scale_factor_signed.get(i))
    }

    pub fn gradient_curves(&self) -> &GradientCurves {
        &self.gradient_curves
    }

    pub fn imdct(&self) -> &ImdctTables {
        &self.imdct
    }
}

impl Default for CodecTables {
    fn default() -> Self {
        Self::new()
    }
}

//! Scale-factor reconstruction.
//!
//! Three schemes share the stream: Huffman-coded differences along frequency (either channel,
//! mode 0), fixed-width values (channel 0, mode 1) and Huffman-coded differences against
//! channel 0 (channel 1, mode 1).

use log::trace;

use crate::bitreader::BitReader;
use crate::error::LdacError;
use crate::tables::{CodecTables, MAX_QUANT_UNITS, SCALE_FACTOR_WEIGHTS};

const MODE_BITS: u32 = 1;
const BITLEN_BITS: u32 = 2;
const OFFSET_BITS: u32 = 5;
const WEIGHT_BITS: u32 = 3;
const RAW_BITS: u32 = 5;

const MIN_BITLEN_DIFF: u32 = 3;
const MIN_BITLEN_FIXED: u32 = 2;
const MIN_BITLEN_SIBLING: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleFactorScheme {
    /// First value raw, then Huffman differences along frequency.
    FrequencyDiff,
    /// Fixed-width values, optionally weighted.
    Fixed,
    /// Huffman differences against channel 0 of the same block.
    SiblingDiff,
}

/// Decoded scale factors of one channel in one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleFactors {
    pub scheme: ScaleFactorScheme,
    pub bitlen: u32,
    pub offset: i32,
    pub weight_table: usize,
    pub values: [i32; MAX_QUANT_UNITS],
}

impl ScaleFactors {
    fn new(scheme: ScaleFactorScheme, bitlen: u32) -> Self {
        Self { scheme, bitlen, offset: 0, weight_table: 0, values: [0; MAX_QUANT_UNITS] }
    }
}

/// Read the scale factors of in-block channel `channel` (0 or 1).
///
/// `sibling` must hold channel 0's finished scale factors when `channel == 1`.
pub fn read_scale_factors(
    br: &mut BitReader<'_>,
    tables: &CodecTables,
    channel: usize,
    quant_units: usize,
    sibling: Option<&ScaleFactors>,
) -> Result<ScaleFactors, LdacError> {
    let mode = br.read(MODE_BITS);

    let sf = match (channel, mode) {
        (_, 0) => read_frequency_diff(br, tables, quant_units)?,
        (0, _) => read_fixed(br, quant_units),
        _ => {
            let sibling = sibling
                .ok_or(LdacError::InvalidInput("sibling scale factors missing for channel 1"))?;
            read_sibling_diff(br, tables, quant_units, sibling)?
        }
    };

    trace!(
        "scale factors ch{channel} {:?} bitlen={} offset={} weight={}: {:?}",
        sf.scheme,
        sf.bitlen,
        sf.offset,
        sf.weight_table,
        &sf.values[..quant_units]
    );

    Ok(sf)
}

fn read_frequency_diff(
    br: &mut BitReader<'_>,
    tables: &CodecTables,
    quant_units: usize,
) -> Result<ScaleFactors, LdacError> {
    let bitlen = br.read(BITLEN_BITS) + MIN_BITLEN_DIFF;
    let mut sf = ScaleFactors::new(ScaleFactorScheme::FrequencyDiff, bitlen);
    sf.offset = br.read(OFFSET_BITS) as i32;
    sf.weight_table = br.read(WEIGHT_BITS) as usize;

    if quant_units == 0 {
        return Ok(sf);
    }

    let codebook = tables
        .scale_factor_unsigned(bitlen)
        .ok_or(LdacError::InvalidInput("no codebook for scale factor bit length"))?;
    let weights = &SCALE_FACTOR_WEIGHTS[sf.weight_table];
    let mask = (1i32 << bitlen) - 1;
    let values = &mut sf.values;

    // Each difference applies to the raw previous value; weights come off afterwards.
    values[0] = br.read(bitlen) as i32;
    for unit in 1..quant_units {
        let diff = codebook.decode_signed(br)?;
        values[unit] = (values[unit - 1] + diff) & mask;
        values[unit - 1] += sf.offset - i32::from(weights[unit - 1]);
    }
    values[quant_units - 1] += sf.offset - i32::from(weights[quant_units - 1]);

    Ok(sf)
}

fn read_fixed(br: &mut BitReader<'_>, quant_units: usize) -> ScaleFactors {
    let bitlen = br.read(BITLEN_BITS) + MIN_BITLEN_FIXED;
    let mut sf = ScaleFactors::new(ScaleFactorScheme::Fixed, bitlen);

    if bitlen > 4 {
        for value in sf.values.iter_mut().take(quant_units) {
            *value = br.read(RAW_BITS) as i32;
        }
    } else {
        sf.offset = br.read(OFFSET_BITS) as i32;
        sf.weight_table = br.read(WEIGHT_BITS) as usize;
        let weights = &SCALE_FACTOR_WEIGHTS[sf.weight_table];
        for (value, &weight) in sf.values.iter_mut().zip(weights).take(quant_units) {
            *value = br.read(bitlen) as i32 - i32::from(weight) + sf.offset;
        }
    }

    sf
}

fn read_sibling_diff(
    br: &mut BitReader<'_>,
    tables: &CodecTables,
    quant_units: usize,
    sibling: &ScaleFactors,
) -> Result<ScaleFactors, LdacError> {
    let bitlen = br.read(BITLEN_BITS) + MIN_BITLEN_SIBLING;
    let mut sf = ScaleFactors::new(ScaleFactorScheme::SiblingDiff, bitlen);

    let codebook = tables
        .scale_factor_signed(bitlen)
        .ok_or(LdacError::InvalidInput("no codebook for scale factor bit length"))?;

    for unit in 0..quant_units {
        sf.values[unit] = sibling.values[unit] + codebook.decode_signed(br)?;
    }

    Ok(sf)
}

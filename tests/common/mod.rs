//! Bit writer and frame builder for hand-made LDAC frames.
//!
//! The builder recomputes the gradient, the precision mask and the coarse/fine precision split
//! of every unit, so it can emit any gradient mode, any of the three scale-factor schemes and
//! fine residuals. Values that do not fit their field or code make it panic.

#![allow(dead_code)]

use rust_ldac::huffman::{CodeTable, SCALE_FACTOR_SIGNED_TABLES, SCALE_FACTOR_UNSIGNED_TABLES};
use rust_ldac::tables::{
    CodecTables, JOINT_2D_SPECTRUM, JOINT_4D_SPECTRUM, QUANT_UNIT_START, QUANT_UNITS_PER_BANDS,
    SCALE_FACTOR_WEIGHTS, WORD_LENGTH,
};
use rust_ldac::DecoderParams;

pub struct BitWriter {
    bytes: Vec<u8>,
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self { bytes: Vec::new(), len: 0 }
    }

    /// Append the low `bits` bits of `value`, MSB first.
    pub fn put(&mut self, value: u32, bits: u32) {
        for i in (0..bits).rev() {
            if self.len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 != 0 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.len % 8);
            }
            self.len += 1;
        }
    }

    /// Append `value` as a two's complement field of `bits` bits.
    pub fn put_signed(&mut self, value: i32, bits: u32) {
        let half = 1i32 << (bits - 1);
        assert!((-half..half).contains(&value), "{value} does not fit {bits} bits");
        self.put((value as u32) & ((1u32 << bits) - 1), bits);
    }

    fn put_code(&mut self, table: &CodeTable, symbol: usize) {
        let bits = table.bits[symbol];
        assert!(bits > 0, "symbol {symbol} has no code");
        self.put(u32::from(table.codes[symbol]), u32::from(bits));
    }

    pub fn align_to_byte(&mut self) {
        self.len = self.bytes.len() * 8;
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Gradient fields of a block.
///
/// Modes 1..=3 only code the start unit and start value; their end point comes from
/// [`DecoderParams::gradient_end`] and `end_unit`/`end_value` are ignored.
#[derive(Clone, Copy)]
pub struct GradientPlan {
    pub mode: u32,
    pub start_unit: usize,
    /// Exclusive.
    pub end_unit: usize,
    pub start_value: i32,
    pub end_value: i32,
    pub boundary: usize,
}

impl GradientPlan {
    /// Mode 0, the same value in every unit.
    pub fn flat(offset: i32) -> Self {
        Self { mode: 0, start_unit: 0, end_unit: 1, start_value: offset, end_value: offset, boundary: 0 }
    }

    pub fn ramp(start_unit: usize, end_unit: usize, start_value: i32, end_value: i32) -> Self {
        Self { mode: 0, start_unit, end_unit, start_value, end_value, boundary: 0 }
    }

    pub fn fixed_end(mode: u32, start_unit: usize, start_value: i32) -> Self {
        assert!((1..=3).contains(&mode));
        Self { mode, start_unit, end_unit: 0, start_value, end_value: 0, boundary: 0 }
    }

    fn resolve(&self, params: &DecoderParams) -> (usize, i32) {
        if self.mode == 0 {
            (self.end_unit, self.end_value)
        } else {
            params.gradient_end()
        }
    }
}

/// How a channel's scale factors are coded.
#[derive(Clone)]
pub enum ScaleFactorCoding {
    /// Fixed 5-bit values.
    Raw(Vec<u32>),
    /// Differences against channel 0, coded with the 2-bit signed table.
    SiblingDiff(Vec<i32>),
    /// Differences between neighbouring units with the `bitlen` table, after subtracting
    /// `offset` and adding the weights of `weight_table`.
    FrequencyDiff { bitlen: u32, offset: i32, weight_table: usize, values: Vec<i32> },
}

#[derive(Clone)]
pub struct ChannelPlan {
    pub scale_factors: ScaleFactorCoding,
    /// One quantized value per spectral line of the coded units.
    pub lines: Vec<i32>,
    /// Fine residual per line; empty means all zero. Only read for units above precision 15.
    pub fine: Vec<i32>,
}

impl ChannelPlan {
    pub fn new(scale_factors: ScaleFactorCoding, lines: Vec<i32>) -> Self {
        Self { scale_factors, lines, fine: Vec::new() }
    }
}

#[derive(Clone)]
pub struct BlockPlan {
    /// Raw 4-bit band field; the band count is this plus 2.
    pub band_code: u32,
    pub gradient: GradientPlan,
    pub channels: Vec<ChannelPlan>,
}

impl BlockPlan {
    pub fn quant_units(&self) -> usize {
        usize::from(QUANT_UNITS_PER_BANDS[self.band_code as usize + 2])
    }

    pub fn lines(&self) -> usize {
        usize::from(QUANT_UNIT_START[self.quant_units()])
    }
}

/// Coarse and fine precision of every unit of one channel.
pub fn unit_precisions(
    tables: &CodecTables,
    params: &DecoderParams,
    gradient: &GradientPlan,
    scale_factors: &[i32],
) -> Vec<(i32, i32)> {
    let units = scale_factors.len();
    let (end_unit, end_value) = gradient.resolve(params);
    let value_count = end_value - gradient.start_value;
    let curve = if value_count != 0 && end_unit > gradient.start_unit {
        tables.gradient_curves().for_span(end_unit - gradient.start_unit)
    } else {
        None
    };

    let mut mask = vec![0; units];
    for unit in 1..units {
        let delta = scale_factors[unit] - scale_factors[unit - 1];
        if delta > 1 {
            mask[unit] += (delta - 1).min(5);
        } else if delta < -1 {
            mask[unit - 1] += (-delta - 1).min(5);
        }
    }

    (0..units)
        .map(|unit| {
            let mut value = if unit < end_unit { -gradient.start_value } else { -end_value };
            if let Some(curve) = curve {
                if (gradient.start_unit..end_unit).contains(&unit) {
                    let weight = i32::from(curve[unit - gradient.start_unit]);
                    value -= ((weight * (value_count - 1)) >> 8) + 1;
                }
            }

            let mut precision = match gradient.mode {
                0 => scale_factors[unit] + value,
                mode => {
                    let sum = scale_factors[unit] + value + mask[unit];
                    match (sum > 0, mode) {
                        (false, _) => sum,
                        (true, 1) => sum / 2,
                        (true, 2) => sum * 3 / 8,
                        (true, _) => sum / 4,
                    }
                }
            };
            precision = precision.max(1);
            if unit < gradient.boundary {
                precision += 1;
            }
            if precision > 15 { (15, precision - 15) } else { (precision, 0) }
        })
        .collect()
}

fn write_scale_factors(w: &mut BitWriter, coding: &ScaleFactorCoding, sibling: &[i32], units: usize) -> Vec<i32> {
    match coding {
        ScaleFactorCoding::Raw(values) => {
            assert_eq!(values.len(), units);
            w.put(1, 1);
            w.put(3, 2);
            for &v in values {
                w.put(v, 5);
            }
            values.iter().map(|&v| v as i32).collect()
        }
        ScaleFactorCoding::SiblingDiff(diffs) => {
            assert_eq!(diffs.len(), units);
            assert_eq!(sibling.len(), units, "sibling coding needs channel 0 first");
            w.put(1, 1);
            w.put(0, 2);
            for &d in diffs {
                w.put_code(&SCALE_FACTOR_SIGNED_TABLES[0], (d & 3) as usize);
            }
            sibling.iter().zip(diffs).map(|(s, d)| s + d).collect()
        }
        ScaleFactorCoding::FrequencyDiff { bitlen, offset, weight_table, values } => {
            assert_eq!(values.len(), units);
            w.put(0, 1);
            w.put(bitlen - 3, 2);
            w.put(*offset as u32, 5);
            w.put(*weight_table as u32, 3);

            let weights = &SCALE_FACTOR_WEIGHTS[*weight_table];
            let raw: Vec<i32> = values
                .iter()
                .zip(weights)
                .map(|(&v, &weight)| v - offset + i32::from(weight))
                .collect();
            assert!(raw.iter().all(|&r| (0..1 << bitlen).contains(&r)), "{raw:?}");

            let table = &SCALE_FACTOR_UNSIGNED_TABLES[*bitlen as usize - 3];
            let mask = (1 << bitlen) - 1;
            w.put(raw[0] as u32, *bitlen);
            for pair in raw.windows(2) {
                w.put_code(table, ((pair[1] - pair[0]) & mask) as usize);
            }
            values.clone()
        }
    }
}

fn joint_index(table: &[u8], values: &[i32]) -> u32 {
    let entry = values.iter().fold(0u8, |acc, &v| {
        assert!((-1..=1).contains(&v), "{v} is not a joint value");
        (acc << 2) | (v + 1) as u8
    });
    let index = table.iter().position(|&e| e == entry);
    index.unwrap_or_else(|| panic!("{values:?} has no joint code")) as u32
}

fn write_block(w: &mut BitWriter, tables: &CodecTables, params: &DecoderParams, block: &BlockPlan) {
    let units = block.quant_units();
    let g = &block.gradient;

    w.put(block.band_code, 4);
    w.put(0, 1);

    w.put(g.mode, 2);
    if g.mode == 0 {
        w.put(g.start_unit as u32, 6);
        w.put(g.end_unit as u32 - 1, 6);
        w.put(g.start_value as u32, 5);
        w.put(g.end_value as u32, 5);
    } else {
        w.put(g.start_unit as u32, 5);
        w.put(g.start_value as u32, 5);
    }
    w.put(g.boundary as u32, 5);

    let mut sibling: Vec<i32> = Vec::new();
    for (index, channel) in block.channels.iter().enumerate() {
        let scale_factors = write_scale_factors(w, &channel.scale_factors, &sibling, units);
        let precisions = unit_precisions(tables, params, g, &scale_factors);

        assert_eq!(channel.lines.len(), block.lines());
        for (unit, &(coarse, _)) in precisions.iter().enumerate() {
            let start = usize::from(QUANT_UNIT_START[unit]);
            let end = usize::from(QUANT_UNIT_START[unit + 1]);
            let lines = &channel.lines[start..end];
            if coarse == 1 {
                if lines.len() == 2 {
                    w.put(joint_index(&JOINT_2D_SPECTRUM, lines), 3);
                } else {
                    for group in lines.chunks(4) {
                        w.put(joint_index(&JOINT_4D_SPECTRUM, group), 7);
                    }
                }
            } else {
                let width = u32::from(WORD_LENGTH[coarse as usize]);
                for &q in lines {
                    w.put_signed(q, width);
                }
            }
        }

        assert!(channel.fine.is_empty() || channel.fine.len() == block.lines());
        for (unit, &(_, fine)) in precisions.iter().enumerate() {
            if fine == 0 {
                continue;
            }
            let width = u32::from(WORD_LENGTH[fine as usize]);
            for line in usize::from(QUANT_UNIT_START[unit])..usize::from(QUANT_UNIT_START[unit + 1]) {
                w.put_signed(channel.fine.get(line).copied().unwrap_or(0), width);
            }
        }

        if index == 0 {
            sibling = scale_factors;
        }
    }

    w.align_to_byte();
}

/// Build a complete frame: header followed by `blocks`, length set to fit the payload.
pub fn build_frame(sample_rate_id: u32, channel_config_id: u32, blocks: &[BlockPlan]) -> Vec<u8> {
    build_frame_with(&CodecTables::shared(), DecoderParams::default(), sample_rate_id, channel_config_id, blocks)
}

/// [`build_frame`] with the gradient curves of `tables` and the gradient end point of `params`.
pub fn build_frame_with(
    tables: &CodecTables,
    params: DecoderParams,
    sample_rate_id: u32,
    channel_config_id: u32,
    blocks: &[BlockPlan],
) -> Vec<u8> {
    let mut payload = BitWriter::new();
    for block in blocks {
        write_block(&mut payload, tables, &params, block);
    }
    let payload = payload.into_bytes();
    with_header(sample_rate_id, channel_config_id, &payload)
}

/// Prefix `payload` with a header declaring exactly its length.
pub fn with_header(sample_rate_id: u32, channel_config_id: u32, payload: &[u8]) -> Vec<u8> {
    with_header_length(sample_rate_id, channel_config_id, payload, payload.len())
}

/// Prefix `payload` with a header declaring `frame_length` payload bytes.
pub fn with_header_length(
    sample_rate_id: u32,
    channel_config_id: u32,
    payload: &[u8],
    frame_length: usize,
) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.put(0xaa, 8);
    w.put(sample_rate_id, 3);
    w.put(channel_config_id, 2);
    w.put(frame_length as u32 - 1, 9);
    w.put(0, 2);
    let mut frame = w.into_bytes();
    frame.extend_from_slice(payload);
    frame
}

/// The same frame with its header declaring one payload byte less.
pub fn one_byte_short(frame: &[u8]) -> Vec<u8> {
    let sample_rate_id = u32::from(frame[1] >> 5);
    let channel_config_id = u32::from((frame[1] >> 3) & 3);
    with_header_length(sample_rate_id, channel_config_id, &frame[3..frame.len() - 1], frame.len() - 4)
}

/// 44.1 kHz mono frame with an all-zero spectrum.
pub fn silent_mono_frame() -> Vec<u8> {
    build_frame(0, 0, &[silent_block()])
}

pub fn silent_block() -> BlockPlan {
    BlockPlan {
        band_code: 0,
        gradient: GradientPlan::flat(0),
        channels: vec![ChannelPlan::new(ScaleFactorCoding::Raw(vec![2; 8]), vec![0; 16])],
    }
}

/// Eight units of mixed precision, scaled into the low thousands.
pub fn tone_block() -> BlockPlan {
    BlockPlan {
        band_code: 0,
        gradient: GradientPlan::flat(20),
        channels: vec![ChannelPlan::new(
            ScaleFactorCoding::Raw(vec![24, 23, 22, 24, 25, 24, 23, 22]),
            vec![5, -3, 2, -1, 1, 0, -7, 4, 10, -12, 3, 3, -2, 1, 0, -1],
        )],
    }
}

pub fn tone_mono_frame() -> Vec<u8> {
    build_frame(0, 0, &[tone_block()])
}

/// Stereo block whose second channel codes its scale factors against the first.
pub fn stereo_block(channel0_scale_factors: Vec<u32>) -> BlockPlan {
    let lines = vec![5, -3, 2, -1, 1, 0, -3, 2, 6, -6, 3, 3, -2, 1, 0, -1];
    BlockPlan {
        band_code: 0,
        gradient: GradientPlan::flat(20),
        channels: vec![
            ChannelPlan::new(ScaleFactorCoding::Raw(channel0_scale_factors), lines.clone()),
            ChannelPlan::new(
                ScaleFactorCoding::SiblingDiff(vec![0, 1, -1, 0, 0, 1, 0, 0]),
                lines.iter().rev().copied().collect(),
            ),
        ],
    }
}

pub fn channel(pcm: &[i16], channels: usize, index: usize) -> Vec<i16> {
    pcm.iter().skip(index).step_by(channels).copied().collect()
}

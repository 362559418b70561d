//! Inverse MDCT for 128- and 256-sample frames.
//!
//! The transform is a DCT-IV (pre-rotation, `bits - 1` butterfly stages, output shuffle)
//! followed by windowed overlap-add against the second half of the previous frame.

use std::f64::consts::PI;

use crate::tables::MAX_FRAME_SAMPLES;

const MAX_TABLE_BITS: usize = 8;
const MIN_FRAME_BITS: u32 = 7;
const MAX_FRAME_BITS: u32 = 8;

/// Trigonometric, shuffle and window tables for every transform size.
#[derive(Debug, Clone)]
pub struct ImdctTables {
    sin: Vec<Vec<f64>>,
    cos: Vec<Vec<f64>>,
    shuffle: Vec<Vec<u16>>,
    /// Synthesis windows for 128 and 256 samples.
    window: Vec<Vec<f64>>,
}

impl ImdctTables {
    pub fn new() -> Self {
        let mut sin = Vec::with_capacity(MAX_TABLE_BITS + 1);
        let mut cos = Vec::with_capacity(MAX_TABLE_BITS + 1);
        let mut shuffle = Vec::with_capacity(MAX_TABLE_BITS + 1);

        for bits in 0..=MAX_TABLE_BITS as u32 {
            let size = 1usize << bits;
            let angles = (0..size).map(|i| PI * (4 * i + 1) as f64 / (4 * size) as f64);
            sin.push(angles.clone().map(f64::sin).collect());
            cos.push(angles.map(f64::cos).collect());
            shuffle.push((0..size as u32).map(|i| bit_reverse(i ^ (i / 2), bits) as u16).collect());
        }

        let window = (MIN_FRAME_BITS..=MAX_FRAME_BITS).map(imdct_window).collect();

        Self { sin, cos, shuffle, window }
    }

    fn window(&self, bits: u32) -> &[f64] {
        &self.window[(bits - MIN_FRAME_BITS) as usize]
    }
}

impl Default for ImdctTables {
    fn default() -> Self {
        Self::new()
    }
}

fn bit_reverse(value: u32, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - bits)
}

/// Analysis window of the encoder: a raised sine from 0 to 1 across the frame.
fn mdct_window(bits: u32) -> Vec<f64> {
    let size = 1usize << bits;
    (0..size)
        .map(|i| ((((i as f64 + 0.5) / size as f64 - 0.5) * PI).sin() + 1.0) * 0.5)
        .collect()
}

fn imdct_window(bits: u32) -> Vec<f64> {
    let mdct = mdct_window(bits);
    let size = mdct.len();
    (0..size)
        .map(|i| {
            let mirrored = mdct[size - 1 - i];
            mdct[i] / (mirrored * mirrored + mdct[i] * mdct[i])
        })
        .collect()
}

/// Per-channel IMDCT state.
///
/// `previous` carries the aliased second half of the last frame into the next call. It starts
/// zeroed and is only ever overwritten by [`Imdct::run`].
#[derive(Debug, Clone)]
pub struct Imdct {
    bits: u32,
    previous: [f64; MAX_FRAME_SAMPLES],
}

impl Imdct {
    pub fn new() -> Self {
        Self { bits: MIN_FRAME_BITS, previous: [0.0; MAX_FRAME_SAMPLES] }
    }

    /// Transform size class of the last call, 7 or 8.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn previous(&self) -> &[f64] {
        &self.previous[..1 << self.bits]
    }

    /// Transform `2^bits` spectral lines into `2^bits` PCM samples.
    pub fn run(&mut self, tables: &ImdctTables, bits: u32, input: &[f32], output: &mut [f32]) {
        assert!(
            (MIN_FRAME_BITS..=MAX_FRAME_BITS).contains(&bits),
            "IMDCT size class must be 7 or 8, got {bits}"
        );
        self.bits = bits;

        let size = 1usize << bits;
        let half = size / 2;
        let window = tables.window(bits);
        let previous = &mut self.previous;

        let mut dct_out = [0f32; MAX_FRAME_SAMPLES];
        dct4(tables, bits, &input[..size], &mut dct_out[..size]);

        for i in 0..half {
            output[i] = (window[i] * f64::from(dct_out[i + half]) + previous[i]) as f32;
            output[i + half] =
                (window[i + half] * -f64::from(dct_out[size - 1 - i]) - previous[i + half]) as f32;
            previous[i] = window[size - 1 - i] * -f64::from(dct_out[half - i - 1]);
            previous[i + half] = window[half - i - 1] * f64::from(dct_out[i]);
        }
    }
}

impl Default for Imdct {
    fn default() -> Self {
        Self::new()
    }
}

/// Unscaled DCT-IV of `2^bits` points.
pub fn dct4(tables: &ImdctTables, bits: u32, input: &[f32], output: &mut [f32]) {
    let size = 1usize << bits;
    let last = size - 1;
    let half = size / 2;
    let mut temp = [0f64; MAX_FRAME_SAMPLES];

    let sin = &tables.sin[bits as usize];
    let cos = &tables.cos[bits as usize];
    for i in 0..half {
        let i2 = i * 2;
        let a = f64::from(input[i2]);
        let b = f64::from(input[last - i2]);
        temp[i2] = a * cos[i] + b * sin[i];
        temp[i2 + 1] = a * sin[i] - b * cos[i];
    }

    let stage_count = bits as usize - 1;
    for stage in 0..stage_count {
        let block_count = 1usize << stage;
        let block_size_bits = stage_count - stage;
        let block_half_bits = block_size_bits - 1;
        let block_size = 1usize << block_size_bits;
        let block_half = 1usize << block_half_bits;
        let sin = &tables.sin[block_half_bits];
        let cos = &tables.cos[block_half_bits];

        for block in 0..block_count {
            for i in 0..block_half {
                let front = (block * block_size + i) * 2;
                let back = front + block_size;
                let a = temp[front] - temp[back];
                let b = temp[front + 1] - temp[back + 1];
                temp[front] += temp[back];
                temp[front + 1] += temp[back + 1];
                temp[back] = a * cos[i] + b * sin[i];
                temp[back + 1] = a * sin[i] - b * cos[i];
            }
        }
    }

    let shuffle = &tables.shuffle[bits as usize];
    for (out, &src) in output.iter_mut().zip(shuffle.iter()) {
        *out = temp[usize::from(src)] as f32;
    }
}

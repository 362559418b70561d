//! Quantized spectrum extraction, dequantization and scale-factor application.

use log::trace;

use crate::bitreader::BitReader;
use crate::error::LdacError;
use crate::tables::{
    FINE_STEP_SIZE, JOINT_2D_SPECTRUM, JOINT_4D_SPECTRUM, MAX_FRAME_SAMPLES, MAX_QUANT_UNITS,
    MAX_SCALE_FACTOR, QUANT_UNIT_LINES, QUANT_UNIT_START, SPECTRUM_SCALE, STEP_SIZE, WORD_LENGTH,
};

const JOINT_2D_BITS: u32 = 3;
const JOINT_4D_BITS: u32 = 7;

/// Precision at which lines are coded jointly instead of one by one.
const JOINT_PRECISION: i32 = 1;

fn unit_lines(unit: usize) -> std::ops::Range<usize> {
    usize::from(QUANT_UNIT_START[unit])..usize::from(QUANT_UNIT_START[unit + 1])
}

/// Split a joint code entry into `N` ternary values in `-1..=1`, most significant first.
fn unpack_joint<const N: usize>(entry: u8) -> [i32; N] {
    let mut values = [0; N];
    for (i, value) in values.iter_mut().enumerate() {
        let shift = 2 * (N - 1 - i);
        *value = i32::from((entry >> shift) & 3) - 1;
    }
    values
}

/// Read the coarse quantized lines of every unit.
pub fn read_spectrum(
    br: &mut BitReader<'_>,
    precisions: &[i32; MAX_QUANT_UNITS],
    quant_units: usize,
    quantized: &mut [i32; MAX_FRAME_SAMPLES],
) -> Result<(), LdacError> {
    for unit in 0..quant_units {
        let lines = unit_lines(unit);
        let precision = precisions[unit];

        if precision == JOINT_PRECISION {
            if QUANT_UNIT_LINES[unit] == 2 {
                let entry = JOINT_2D_SPECTRUM[br.read(JOINT_2D_BITS) as usize];
                quantized[lines].copy_from_slice(&unpack_joint::<2>(entry));
            } else {
                for group in quantized[lines].chunks_exact_mut(4) {
                    let bit_pos = br.bits_read();
                    let entry = JOINT_4D_SPECTRUM
                        .get(br.read(JOINT_4D_BITS) as usize)
                        .ok_or(LdacError::InvalidCode { bit_pos })?;
                    group.copy_from_slice(&unpack_joint::<4>(*entry));
                }
            }
        } else {
            let width = u32::from(WORD_LENGTH[precision as usize]);
            for q in &mut quantized[lines] {
                *q = br.read_signed(width);
            }
        }
    }

    trace!("quantized spectrum = {:?}", &quantized[..usize::from(QUANT_UNIT_START[quant_units])]);
    Ok(())
}

/// Read the residual refinement for units whose precision overflowed.
pub fn read_spectrum_fine(
    br: &mut BitReader<'_>,
    fine_precisions: &[i32; MAX_QUANT_UNITS],
    quant_units: usize,
    quantized_fine: &mut [i32; MAX_FRAME_SAMPLES],
) {
    quantized_fine.fill(0);
    for unit in 0..quant_units {
        let precision = fine_precisions[unit];
        if precision <= 0 {
            continue;
        }
        let width = u32::from(WORD_LENGTH[precision as usize]);
        for q in &mut quantized_fine[unit_lines(unit)] {
            *q = br.read_signed(width);
        }
    }
}

/// Turn quantized lines into spectral values. Lines past the last unit are zeroed.
pub fn dequantize(
    quantized: &[i32; MAX_FRAME_SAMPLES],
    quantized_fine: &[i32; MAX_FRAME_SAMPLES],
    precisions: &[i32; MAX_QUANT_UNITS],
    quant_units: usize,
    spectra: &mut [f32; MAX_FRAME_SAMPLES],
) {
    spectra.fill(0.0);
    for unit in 0..quant_units {
        let precision = precisions[unit] as usize;
        let step = STEP_SIZE[precision];
        let fine_step = FINE_STEP_SIZE[precision];
        for line in unit_lines(unit) {
            let coarse = quantized[line] as f32 * step;
            let fine = quantized_fine[line] as f32 * fine_step;
            spectra[line] = (f64::from(coarse) + f64::from(fine)) as f32;
        }
    }
}

/// Multiply each unit by `2^(sf - 15)`. Units with a non-positive scale factor are left as is.
pub fn scale(
    spectra: &mut [f32; MAX_FRAME_SAMPLES],
    scale_factors: &[i32; MAX_QUANT_UNITS],
    quant_units: usize,
) -> Result<(), LdacError> {
    for unit in 0..quant_units {
        let sf = scale_factors[unit];
        if sf > MAX_SCALE_FACTOR {
            return Err(LdacError::InvalidScaleFactor { unit, value: sf });
        }
        if sf <= 0 {
            continue;
        }
        let factor = SPECTRUM_SCALE[sf as usize];
        for s in &mut spectra[unit_lines(unit)] {
            *s = (f64::from(*s) * factor) as f32;
        }
    }
    Ok(())
}

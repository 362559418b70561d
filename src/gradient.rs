//! Bit-precision allocation: the gradient curve, the precision mask and the final per-unit
//! coarse/fine precisions.

use log::trace;

use crate::bitreader::BitReader;
use crate::error::LdacError;
use crate::params::DecoderParams;
use crate::tables::{GradientCurves, MAX_GRADIENT_UNITS, MAX_PRECISION, MAX_QUANT_UNITS, MIN_PRECISION};

const GRAD_MODE_BITS: u32 = 2;
const GRAD_OFFSET_BITS: u32 = 5;
const GRAD_UNIT_BITS_MODE0: u32 = 6;
const GRAD_UNIT_BITS: u32 = 5;
const BOUNDARY_BITS: u32 = 5;

const MAX_MASK_STEP: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientMode {
    /// Precision is scale factor plus gradient.
    Direct,
    /// Masked sum halved.
    Half,
    /// Masked sum times 3/8.
    ThreeEighths,
    /// Masked sum quartered.
    Quarter,
}

impl GradientMode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => GradientMode::Direct,
            1 => GradientMode::Half,
            2 => GradientMode::ThreeEighths,
            _ => GradientMode::Quarter,
        }
    }

    /// Apply the mode's scaling to a positive masked sum.
    fn scale(self, sum: i32) -> i32 {
        match self {
            GradientMode::Direct => sum,
            GradientMode::Half => sum / 2,
            GradientMode::ThreeEighths => sum * 3 / 8,
            GradientMode::Quarter => sum / 4,
        }
    }
}

/// Gradient parameters of one block and the curve derived from them.
#[derive(Debug, Clone)]
pub struct Gradient {
    pub mode: GradientMode,
    pub start_unit: usize,
    pub end_unit: usize,
    pub start_value: i32,
    pub end_value: i32,
    /// Units below this index get one extra bit of precision.
    pub boundary: usize,
    pub values: [i32; MAX_QUANT_UNITS],
}

impl Gradient {
    pub fn read(br: &mut BitReader<'_>, params: &DecoderParams) -> Result<Self, LdacError> {
        let mode = GradientMode::from_bits(br.read(GRAD_MODE_BITS));

        let (start_unit, end_unit, start_value, end_value) = match mode {
            GradientMode::Direct => {
                let start_unit = br.read(GRAD_UNIT_BITS_MODE0) as usize;
                let end_unit = br.read(GRAD_UNIT_BITS_MODE0) as usize + 1;
                let start_value = br.read(GRAD_OFFSET_BITS) as i32;
                let end_value = br.read(GRAD_OFFSET_BITS) as i32;
                (start_unit, end_unit, start_value, end_value)
            }
            _ => {
                let start_unit = br.read(GRAD_UNIT_BITS) as usize;
                let start_value = br.read(GRAD_OFFSET_BITS) as i32;
                let (end_unit, end_value) = params.gradient_end();
                (start_unit, end_unit, start_value, end_value)
            }
        };

        // Units past the end only take the end value; the ramp itself needs a curve.
        if end_unit.saturating_sub(start_unit) > MAX_GRADIENT_UNITS {
            return Err(LdacError::InvalidHeader("gradient span longer than the curve table"));
        }

        let boundary = br.read(BOUNDARY_BITS) as usize;

        trace!(
            "gradient mode={mode:?} units=[{start_unit}, {end_unit}) values=[{start_value}, {end_value}] boundary={boundary}"
        );

        Ok(Self {
            mode,
            start_unit,
            end_unit,
            start_value,
            end_value,
            boundary,
            values: [0; MAX_QUANT_UNITS],
        })
    }

    /// Fill `values` for the first `quant_units` units.
    pub fn calculate(&mut self, curves: &GradientCurves, quant_units: usize) {
        let value_count = self.end_value - self.start_value;
        let curve = if value_count != 0 && self.end_unit > self.start_unit {
            curves.for_span(self.end_unit - self.start_unit)
        } else {
            None
        };

        self.values = [0; MAX_QUANT_UNITS];
        for (unit, value) in self.values.iter_mut().enumerate().take(quant_units) {
            *value = if unit < self.end_unit { -self.start_value } else { -self.end_value };

            // Same expression for rising and falling ramps; the sign of `value_count`
            // carries the direction.
            if let Some(curve) = curve {
                if unit >= self.start_unit && unit < self.end_unit {
                    let weight = i32::from(curve[unit - self.start_unit]);
                    *value -= ((weight * (value_count - 1)) >> 8) + 1;
                }
            }
        }

        trace!("gradient = {:?}", &self.values[..quant_units]);
    }
}

/// Extra precision for units next to a steep scale-factor step.
pub fn precision_mask(
    scale_factors: &[i32; MAX_QUANT_UNITS],
    quant_units: usize,
) -> [i32; MAX_QUANT_UNITS] {
    let mut mask = [0; MAX_QUANT_UNITS];
    for unit in 1..quant_units {
        let delta = scale_factors[unit] - scale_factors[unit - 1];
        if delta > 1 {
            mask[unit] += (delta - 1).min(MAX_MASK_STEP);
        } else if delta < -1 {
            mask[unit - 1] += (-delta - 1).min(MAX_MASK_STEP);
        }
    }
    mask
}

/// Coarse and fine word-length indices per quantization unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precisions {
    pub coarse: [i32; MAX_QUANT_UNITS],
    pub fine: [i32; MAX_QUANT_UNITS],
}

pub fn precisions(
    gradient: &Gradient,
    scale_factors: &[i32; MAX_QUANT_UNITS],
    mask: &[i32; MAX_QUANT_UNITS],
    quant_units: usize,
) -> Result<Precisions, LdacError> {
    let mut coarse = [0; MAX_QUANT_UNITS];
    let mut fine = [0; MAX_QUANT_UNITS];

    for unit in 0..quant_units {
        let precision = match gradient.mode {
            GradientMode::Direct => scale_factors[unit] + gradient.values[unit],
            mode => {
                let sum = scale_factors[unit] + gradient.values[unit] + mask[unit];
                if sum > 0 { mode.scale(sum) } else { sum }
            }
        };
        coarse[unit] = precision.max(MIN_PRECISION);
    }

    for p in coarse.iter_mut().take(gradient.boundary.min(quant_units)) {
        *p += 1;
    }

    for unit in 0..quant_units {
        if coarse[unit] > MAX_PRECISION {
            fine[unit] = coarse[unit] - MAX_PRECISION;
            coarse[unit] = MAX_PRECISION;
            if fine[unit] > MAX_PRECISION {
                return Err(LdacError::InvalidPrecision { unit, precision: fine[unit] });
            }
        }
    }

    trace!("precisions = {:?}", &coarse[..quant_units]);
    trace!("precisions fine = {:?}", &fine[..quant_units]);

    Ok(Precisions { coarse, fine })
}

use std::sync::Arc;

use log::{debug, trace};

use crate::bitreader::BitReader;
use crate::error::LdacError;
use crate::frame::{BandInfo, FrameHeader};
use crate::gradient::{Gradient, precision_mask, precisions};
use crate::imdct::Imdct;
use crate::params::DecoderParams;
use crate::scale_factor::{ScaleFactors, read_scale_factors};
use crate::spectrum::{dequantize, read_spectrum, read_spectrum_fine, scale};
use crate::tables::{CodecTables, HEADER_BYTES, MAX_FRAME_SAMPLES};

const MAX_CHANNELS: usize = 2;

/// Outcome of one successfully decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Header plus payload bytes, always `frame_length + 3`.
    pub bytes_consumed: usize,
    pub samples_per_channel: usize,
    pub channels: usize,
    pub sample_rate: u32,
    pub status: u8,
}

impl FrameInfo {
    /// Interleaved samples written to the output buffer.
    pub fn total_samples(&self) -> usize {
        self.samples_per_channel * self.channels
    }
}

/// Decoded PCM of a whole buffer of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Interleaved signed 16-bit samples.
    pub pcm: Vec<i16>,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Frame-by-frame LDAC decoder.
///
/// Holds the IMDCT overlap state of both output channels, so one instance must see the frames of
/// one stream in order. A frame that fails to decode leaves the state untouched.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    tables: Arc<CodecTables>,
    params: DecoderParams,
    imdct: [Imdct; MAX_CHANNELS],
    spectra: [[f32; MAX_FRAME_SAMPLES]; MAX_CHANNELS],
    pcm: [[f32; MAX_FRAME_SAMPLES]; MAX_CHANNELS],
    last_header: Option<FrameHeader>,
}

impl FrameDecoder {
    pub fn new(params: DecoderParams) -> Self {
        Self::with_tables(CodecTables::shared(), params)
    }

    pub fn with_tables(tables: Arc<CodecTables>, params: DecoderParams) -> Self {
        Self {
            tables,
            params,
            imdct: [Imdct::new(), Imdct::new()],
            spectra: [[0.0; MAX_FRAME_SAMPLES]; MAX_CHANNELS],
            pcm: [[0.0; MAX_FRAME_SAMPLES]; MAX_CHANNELS],
            last_header: None,
        }
    }

    pub fn params(&self) -> DecoderParams {
        self.params
    }

    /// Header of the most recently decoded frame.
    pub fn last_header(&self) -> Option<FrameHeader> {
        self.last_header
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.last_header.map(|h| h.sample_rate.hz())
    }

    pub fn channel_count(&self) -> Option<usize> {
        self.last_header.map(|h| h.channel_count())
    }

    pub fn frame_samples(&self) -> Option<usize> {
        self.last_header.map(|h| h.frame_samples())
    }

    /// Decode the frame at the start of `input` into interleaved 16-bit PCM.
    ///
    /// `pcm` must hold at least `frame_samples * channels` samples. Bytes after the frame are
    /// ignored.
    pub fn decode_frame(&mut self, input: &[u8], pcm: &mut [i16]) -> Result<FrameInfo, LdacError> {
        let info = self.decode_frame_internal(input, pcm.len())?;
        for (i, out) in pcm[..info.total_samples()].iter_mut().enumerate() {
            let sample = self.pcm[i % info.channels][i / info.channels];
            *out = to_i16(sample);
        }
        Ok(info)
    }

    /// Same as [`FrameDecoder::decode_frame`] with samples scaled by `1 / 32768` and clamped to
    /// `[-1, 1]`. No rounding to 16-bit steps happens on this path.
    pub fn decode_frame_f32(&mut self, input: &[u8], pcm: &mut [f32]) -> Result<FrameInfo, LdacError> {
        let info = self.decode_frame_internal(input, pcm.len())?;
        for (i, out) in pcm[..info.total_samples()].iter_mut().enumerate() {
            let sample = self.pcm[i % info.channels][i / info.channels];
            *out = to_unit_f32(sample);
        }
        Ok(info)
    }

    /// Write the packet that stands in for a lost frame of the current layout.
    pub fn null_frame_packet(&self, out: &mut [u8]) -> Result<usize, LdacError> {
        let header = self
            .last_header
            .ok_or(LdacError::InvalidInput("no frame decoded yet"))?;
        header.channel_config.write_null_packet(out)
    }

    fn decode_frame_internal(&mut self, input: &[u8], capacity: usize) -> Result<FrameInfo, LdacError> {
        let header = FrameHeader::peek(input)?;
        let frame_bytes = header.frame_bytes();
        if input.len() < frame_bytes {
            return Err(LdacError::UnexpectedEof { needed: frame_bytes, available: input.len() });
        }

        let channels = header.channel_count();
        let samples = header.frame_samples();
        let needed = samples * channels;
        if capacity < needed {
            return Err(LdacError::OutputTooSmall { needed, available: capacity });
        }

        debug!(
            "frame: {} Hz, {:?}, {} bytes, status {}",
            header.sample_rate.hz(),
            header.channel_config,
            frame_bytes,
            header.status
        );

        self.parse_blocks(&header, &input[..frame_bytes])?;

        // Parsing succeeded, so the overlap state can move forward.
        let bits = header.sample_rate.frame_bits();
        let tables = self.tables.imdct();
        for ch in 0..channels {
            self.imdct[ch].run(tables, bits, &self.spectra[ch], &mut self.pcm[ch]);
        }
        self.last_header = Some(header);

        Ok(FrameInfo {
            bytes_consumed: frame_bytes,
            samples_per_channel: samples,
            channels,
            sample_rate: header.sample_rate.hz(),
            status: header.status,
        })
    }

    /// Read every block of the frame into `self.spectra`. Nothing else is touched.
    fn parse_blocks(&mut self, header: &FrameHeader, frame: &[u8]) -> Result<(), LdacError> {
        let frame_bits = frame.len() * 8;
        let mut br = BitReader::new(frame);
        br.skip((HEADER_BYTES * 8) as u32);

        let tables = &*self.tables;
        let mut quantized = [0i32; MAX_FRAME_SAMPLES];
        let mut quantized_fine = [0i32; MAX_FRAME_SAMPLES];

        for (block_index, block) in header.channel_config.blocks().iter().enumerate() {
            let band = BandInfo::read(&mut br)?;
            let quant_units = band.quant_units;

            let mut gradient = Gradient::read(&mut br, &self.params)?;
            gradient.calculate(tables.gradient_curves(), quant_units);

            let mut sibling: Option<ScaleFactors> = None;
            for channel in 0..block.channels() {
                let sf =
                    read_scale_factors(&mut br, tables, channel, quant_units, sibling.as_ref())?;
                let mask = precision_mask(&sf.values, quant_units);
                let precision = precisions(&gradient, &sf.values, &mask, quant_units)?;

                read_spectrum(&mut br, &precision.coarse, quant_units, &mut quantized)?;
                read_spectrum_fine(&mut br, &precision.fine, quant_units, &mut quantized_fine);

                // Dual mono carries one channel per block.
                let spectra = &mut self.spectra[block_index + channel];
                dequantize(&quantized, &quantized_fine, &precision.coarse, quant_units, spectra);
                scale(spectra, &sf.values, quant_units)?;

                if channel == 0 {
                    sibling = Some(sf);
                }
            }

            br.align_to_byte();
            trace!("block {block_index} ends at bit {}", br.bits_read());
            if br.bits_read() > frame_bits {
                return Err(LdacError::FrameOverrun { bit_pos: br.bits_read(), frame_bits });
            }
        }

        Ok(())
    }
}

/// Round half up and saturate.
fn to_i16(sample: f32) -> i16 {
    let rounded = (f64::from(sample) + 0.5).floor();
    rounded.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

fn to_unit_f32(sample: f32) -> f32 {
    (sample / 32768.0).clamp(-1.0, 1.0)
}

/// Decode a buffer of back-to-back frames.
///
/// Trailing bytes too short to hold a complete frame are an error, as is a change of sample rate
/// or channel layout between frames.
pub fn decode(input: &[u8], params: DecoderParams) -> Result<DecodedAudio, LdacError> {
    decode_with_tables(input, CodecTables::shared(), params)
}

/// [`decode`] with caller-provided tables, e.g. to supply the encoder's gradient curves.
pub fn decode_with_tables(
    input: &[u8],
    tables: Arc<CodecTables>,
    params: DecoderParams,
) -> Result<DecodedAudio, LdacError> {
    let mut decoder = FrameDecoder::with_tables(tables, params);
    let mut frame_pcm = [0i16; MAX_FRAME_SAMPLES * MAX_CHANNELS];
    let mut audio = DecodedAudio { pcm: Vec::new(), sample_rate: 0, channels: 0 };

    let mut pos = 0;
    while pos < input.len() {
        let info = decoder.decode_frame(&input[pos..], &mut frame_pcm)?;

        if audio.channels == 0 {
            audio.sample_rate = info.sample_rate;
            audio.channels = info.channels;
        } else if audio.sample_rate != info.sample_rate || audio.channels != info.channels {
            return Err(LdacError::InvalidInput("stream format changed between frames"));
        }

        audio.pcm.extend_from_slice(&frame_pcm[..info.total_samples()]);
        pos += info.bytes_consumed;
    }

    debug!("decoded {} bytes into {} samples", input.len(), audio.pcm.len());
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_half_up_and_saturating() {
        assert_eq!(to_i16(0.5), 1);
        assert_eq!(to_i16(-0.5), 0);
        assert_eq!(to_i16(-0.51), -1);
        assert_eq!(to_i16(1.49), 1);
        assert_eq!(to_i16(40_000.0), i16::MAX);
        assert_eq!(to_i16(-40_000.0), i16::MIN);
    }

    #[test]
    fn float_output_keeps_sub_step_detail() {
        assert_eq!(to_unit_f32(0.25), 0.25 / 32768.0);
        assert_eq!(to_unit_f32(-16384.0), -0.5);
        assert_eq!(to_unit_f32(40_000.0), 1.0);
        assert_eq!(to_unit_f32(-40_000.0), -1.0);
        // 0.25 rounds to 0 on the 16-bit path
        assert_eq!(to_i16(0.25), 0);
    }

    #[test]
    fn accessors_are_empty_before_first_frame() {
        let decoder = FrameDecoder::new(DecoderParams::default());
        assert_eq!(decoder.last_header(), None);
        assert_eq!(decoder.sample_rate(), None);
        assert_eq!(decoder.channel_count(), None);
        assert_eq!(decoder.frame_samples(), None);

        let mut out = [0u8; 16];
        assert!(matches!(decoder.null_frame_packet(&mut out), Err(LdacError::InvalidInput(_))));
    }

    #[test]
    fn sync_mismatch_consumes_nothing() {
        let mut decoder = FrameDecoder::new(DecoderParams::default());
        let mut pcm = [0i16; 512];
        assert_eq!(
            decoder.decode_frame(&[0x00, 0xaa, 0x00, 0x00], &mut pcm),
            Err(LdacError::SyncMismatch { found: 0x00 })
        );
        assert_eq!(decoder.last_header(), None);
    }

    #[test]
    fn short_output_is_rejected_before_decoding() {
        let mut decoder = FrameDecoder::new(DecoderParams::default());
        // 96 kHz mono, one payload byte
        let frame = [0xaa, 0x60, 0x00, 0x00];
        let mut pcm = [0i16; 100];
        assert_eq!(
            decoder.decode_frame(&frame, &mut pcm),
            Err(LdacError::OutputTooSmall { needed: 256, available: 100 })
        );
    }

    #[test]
    fn empty_input_decodes_to_nothing() -> anyhow::Result<()> {
        let audio = decode(&[], DecoderParams::default())?;
        assert!(audio.pcm.is_empty());
        assert_eq!(audio.channels, 0);
        Ok(())
    }
}

//! Frame header, channel layout and per-block band information.

use log::trace;

use crate::bitreader::BitReader;
use crate::error::LdacError;
use crate::tables::{
    HEADER_BYTES, MAX_BANDS, NULL_BLOCK_MONO, NULL_BLOCK_STEREO, QUANT_UNITS_PER_BANDS, SYNC_WORD,
};

const SYNC_BITS: u32 = 8;
const SAMPLE_RATE_BITS: u32 = 3;
const CHANNEL_CONFIG_BITS: u32 = 2;
const FRAME_LENGTH_BITS: u32 = 9;
const FRAME_STATUS_BITS: u32 = 2;

const BAND_BITS: u32 = 4;
const BAND_OFFSET: u32 = 2;
const BAND_FLAG_BITS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Hz44100,
    Hz48000,
    Hz88200,
    Hz96000,
}

impl SampleRate {
    pub fn from_id(id: u32) -> Result<Self, LdacError> {
        match id {
            0 => Ok(Self::Hz44100),
            1 => Ok(Self::Hz48000),
            2 => Ok(Self::Hz88200),
            3 => Ok(Self::Hz96000),
            _ => Err(LdacError::InvalidHeader("reserved sample rate id")),
        }
    }

    pub fn hz(self) -> u32 {
        match self {
            Self::Hz44100 => 44_100,
            Self::Hz48000 => 48_000,
            Self::Hz88200 => 88_200,
            Self::Hz96000 => 96_000,
        }
    }

    /// log2 of the samples per channel in one frame.
    pub fn frame_bits(self) -> u32 {
        match self {
            Self::Hz44100 | Self::Hz48000 => 7,
            Self::Hz88200 | Self::Hz96000 => 8,
        }
    }

    pub fn frame_samples(self) -> usize {
        1 << self.frame_bits()
    }
}

/// Coding layout of one block inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Mono,
    Stereo,
}

impl BlockType {
    pub fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }

    /// Payload of a block that decodes to silence.
    pub fn null_block(self) -> &'static [u8] {
        match self {
            Self::Mono => &NULL_BLOCK_MONO,
            Self::Stereo => &NULL_BLOCK_STEREO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelConfig {
    Mono,
    DualMono,
    Stereo,
}

impl ChannelConfig {
    pub fn from_id(id: u32) -> Result<Self, LdacError> {
        match id {
            0 => Ok(Self::Mono),
            1 => Ok(Self::DualMono),
            2 => Ok(Self::Stereo),
            _ => Err(LdacError::InvalidHeader("reserved channel configuration id")),
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Self::Mono => 0,
            Self::DualMono => 1,
            Self::Stereo => 2,
        }
    }

    pub fn channel_count(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::DualMono | Self::Stereo => 2,
        }
    }

    /// Blocks of a frame in stream order.
    pub fn blocks(self) -> &'static [BlockType] {
        match self {
            Self::Mono => &[BlockType::Mono],
            Self::DualMono => &[BlockType::Mono, BlockType::Mono],
            Self::Stereo => &[BlockType::Stereo],
        }
    }

    /// Size of the null packet for this layout.
    pub fn null_packet_len(self) -> usize {
        self.blocks().iter().map(|b| b.null_block().len()).sum()
    }

    /// Write the block payloads that decode to silence, one per block. Returns bytes written.
    pub fn write_null_packet(self, out: &mut [u8]) -> Result<usize, LdacError> {
        let needed = self.null_packet_len();
        if out.len() < needed {
            return Err(LdacError::OutputTooSmall { needed, available: out.len() });
        }

        let mut pos = 0;
        for block in self.blocks() {
            let data = block.null_block();
            out[pos..pos + data.len()].copy_from_slice(data);
            pos += data.len();
        }
        Ok(pos)
    }
}

/// The 24-bit header in front of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    pub sample_rate: SampleRate,
    pub channel_config: ChannelConfig,
    /// Payload bytes following the header.
    pub frame_length: usize,
    pub status: u8,
}

impl FrameHeader {
    pub fn parse(br: &mut BitReader<'_>) -> Result<Self, LdacError> {
        let sync = br.read(SYNC_BITS) as u8;
        if sync != SYNC_WORD {
            return Err(LdacError::SyncMismatch { found: sync });
        }

        let sample_rate = SampleRate::from_id(br.read(SAMPLE_RATE_BITS))?;
        let channel_config = ChannelConfig::from_id(br.read(CHANNEL_CONFIG_BITS))?;
        let frame_length = br.read(FRAME_LENGTH_BITS) as usize + 1;
        let status = br.read(FRAME_STATUS_BITS) as u8;

        Ok(Self { sample_rate, channel_config, frame_length, status })
    }

    /// Parse the header at the start of `bytes` without decoding the frame.
    pub fn peek(bytes: &[u8]) -> Result<Self, LdacError> {
        // A wrong first byte is known before the rest of the header arrives.
        if let Some(&found) = bytes.first().filter(|&&b| b != SYNC_WORD) {
            return Err(LdacError::SyncMismatch { found });
        }
        if bytes.len() < HEADER_BYTES {
            return Err(LdacError::UnexpectedEof { needed: HEADER_BYTES, available: bytes.len() });
        }
        Self::parse(&mut BitReader::new(&bytes[..HEADER_BYTES]))
    }

    /// Header plus payload.
    pub fn frame_bytes(&self) -> usize {
        self.frame_length + HEADER_BYTES
    }

    pub fn frame_samples(&self) -> usize {
        self.sample_rate.frame_samples()
    }

    pub fn channel_count(&self) -> usize {
        self.channel_config.channel_count()
    }
}

/// Band count and the number of quantization units it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandInfo {
    pub bands: usize,
    pub quant_units: usize,
}

impl BandInfo {
    pub fn read(br: &mut BitReader<'_>) -> Result<Self, LdacError> {
        let bands = (br.read(BAND_BITS) + BAND_OFFSET) as usize;
        br.skip(BAND_FLAG_BITS);

        if bands > MAX_BANDS {
            return Err(LdacError::InvalidHeader("band count out of range"));
        }
        let quant_units = usize::from(QUANT_UNITS_PER_BANDS[bands]);
        trace!("bands = {bands}, quantization units = {quant_units}");

        Ok(Self { bands, quant_units })
    }
}

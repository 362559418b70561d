//! `rust-ldac` is a pure Rust decoder for **LDAC** audio frames.
//!
//! Each frame carries Huffman- and fixed-width-coded quantized spectra for one or two channels.
//! Decoding reconstructs scale factors and bit allocation, dequantizes the spectra and runs an
//! IMDCT with overlap-add, producing 128 or 256 samples per channel.
//!
//! # Quick start
//!
//! ```
//! use rust_ldac::{decode, DecoderParams};
//!
//! # fn main() -> Result<(), rust_ldac::LdacError> {
//! // One 44.1 kHz mono frame whose spectrum is all zero.
//! let stream = [
//!     0xaa, 0x00, 0x3c, 0x00, 0x00, 0x00, 0x00, 0x38, 0x84, 0x21, //
//!     0x08, 0x42, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//! ];
//!
//! let audio = decode(&stream, DecoderParams::default())?;
//! assert_eq!(audio.sample_rate, 44_100);
//! assert_eq!(audio.channels, 1);
//! assert_eq!(audio.pcm.len(), 128);
//! assert!(audio.pcm.iter().all(|&s| s == 0));
//! # Ok(())
//! # }
//! ```
//!
//! For frame-at-a-time decoding use [`FrameDecoder`]; for arbitrary input chunking use the
//! streaming [`Decoder`].

use std::sync::Arc;

pub mod bitreader;
mod decoder;
pub mod error;
pub mod frame;
pub mod gradient;
pub mod huffman;
pub mod imdct;
pub mod params;
pub mod scale_factor;
pub mod spectrum;
mod stream;
pub mod tables;

pub use crate::error::LdacError;
pub use crate::frame::{BlockType, ChannelConfig, FrameHeader, SampleRate};
pub use crate::params::{DecoderFlags, DecoderParams};
pub use crate::tables::{CodecTables, GradientCurves};

pub use crate::decoder::{DecodedAudio, FrameDecoder, FrameInfo};
pub use crate::stream::{DecodeStatus, Decoder, Flush};

/// Decode a buffer of back-to-back LDAC frames into interleaved 16-bit PCM.
///
/// Every byte of `input` must belong to a complete frame, and all frames must share one sample
/// rate and channel layout. Use [`Decoder`] with [`DecoderFlags::RESYNC`] for damaged streams.
pub fn decode(input: &[u8], params: DecoderParams) -> Result<DecodedAudio, LdacError> {
    decoder::decode(input, params)
}

/// [`decode`] with caller-provided tables, e.g. ones built with
/// [`CodecTables::with_gradient_curves`].
pub fn decode_with_tables(
    input: &[u8],
    tables: Arc<CodecTables>,
    params: DecoderParams,
) -> Result<DecodedAudio, LdacError> {
    decoder::decode_with_tables(input, tables, params)
}

/// Build the shared decoding tables if needed and return them.
///
/// Decoders build the tables lazily on first use; calling this up front moves that cost out of
/// the first decoded frame. Repeated calls return the same instance.
pub fn initialize() -> Arc<CodecTables> {
    CodecTables::shared()
}

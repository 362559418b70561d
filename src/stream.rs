//! Push-input / pull-output decoding of a byte stream of back-to-back frames.

use std::sync::Arc;

use log::{debug, warn};

use crate::decoder::FrameDecoder;
use crate::error::LdacError;
use crate::params::{DecoderFlags, DecoderParams};
use crate::tables::{CodecTables, MAX_FRAME_SAMPLES, SYNC_WORD};

const MAX_FRAME_PCM: usize = MAX_FRAME_SAMPLES * 2;

/// Whether more input may still arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    NoFlush,
    /// No more input will be pushed. Trailing bytes that cannot form a frame are an error
    /// unless [`DecoderFlags::RESYNC`] is set.
    Flush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every buffered byte has been used; push more input.
    NeedInput,
    /// The output buffer is full; call again with more room.
    NeedOutput,
    /// Input flushed and every sample written.
    Finished,
}

/// Streaming decoder producing interleaved 16-bit PCM.
#[derive(Debug, Clone)]
pub struct Decoder {
    frame: FrameDecoder,
    input: Vec<u8>,
    in_pos: usize,
    pending: [i16; MAX_FRAME_PCM],
    pending_pos: usize,
    pending_len: usize,
    total_in: u64,
    total_out: u64,
    frames_decoded: u64,
    bytes_skipped: u64,
}

impl Decoder {
    pub fn new(params: DecoderParams) -> Self {
        Self::with_tables(CodecTables::shared(), params)
    }

    pub fn with_tables(tables: Arc<CodecTables>, params: DecoderParams) -> Self {
        Self {
            frame: FrameDecoder::with_tables(tables, params),
            input: Vec::new(),
            in_pos: 0,
            pending: [0; MAX_FRAME_PCM],
            pending_pos: 0,
            pending_len: 0,
            total_in: 0,
            total_out: 0,
            frames_decoded: 0,
            bytes_skipped: 0,
        }
    }

    pub fn push_input(&mut self, data: &[u8]) {
        if self.in_pos > 0 {
            self.input.drain(..self.in_pos);
            self.in_pos = 0;
        }
        self.input.extend_from_slice(data);
    }

    /// Decode as much as fits into `out`. Returns the number of samples written and what the
    /// decoder needs next.
    pub fn decode(&mut self, out: &mut [i16], flush: Flush) -> Result<(usize, DecodeStatus), LdacError> {
        let mut written = 0;

        loop {
            let n = (self.pending_len - self.pending_pos).min(out.len() - written);
            out[written..written + n]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
            self.pending_pos += n;
            written += n;
            self.total_out += n as u64;

            let input_left = self.input.len() - self.in_pos;
            if self.pending_pos < self.pending_len || (written == out.len() && input_left > 0) {
                return Ok((written, DecodeStatus::NeedOutput));
            }

            if input_left == 0 {
                let status = match flush {
                    Flush::Flush => DecodeStatus::Finished,
                    Flush::NoFlush => DecodeStatus::NeedInput,
                };
                return Ok((written, status));
            }

            match self.frame.decode_frame(&self.input[self.in_pos..], &mut self.pending) {
                Ok(info) => {
                    self.in_pos += info.bytes_consumed;
                    self.total_in += info.bytes_consumed as u64;
                    self.pending_pos = 0;
                    self.pending_len = info.total_samples();
                    self.frames_decoded += 1;
                }
                Err(e) if e.is_incomplete() => match flush {
                    Flush::NoFlush => return Ok((written, DecodeStatus::NeedInput)),
                    Flush::Flush if self.resync_enabled() => {
                        debug!("dropping {input_left} trailing bytes");
                        self.skip(input_left);
                    }
                    Flush::Flush => return Err(e),
                },
                Err(e) if self.resync_enabled() => {
                    warn!("{e} at stream offset {}, resynchronising", self.total_in);
                    self.resync();
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Input bytes used so far, frames and skipped bytes alike.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Samples handed out so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Bytes discarded while looking for the next frame.
    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }

    pub fn frame_decoder(&self) -> &FrameDecoder {
        &self.frame
    }

    fn resync_enabled(&self) -> bool {
        self.frame.params().flags.contains(DecoderFlags::RESYNC)
    }

    /// Drop the current byte and everything up to the next sync byte.
    fn resync(&mut self) {
        let rest = &self.input[self.in_pos + 1..];
        let skip = 1 + rest.iter().position(|&b| b == SYNC_WORD).unwrap_or(rest.len());
        self.skip(skip);
    }

    fn skip(&mut self, n: usize) {
        self.in_pos += n;
        self.total_in += n as u64;
        self.bytes_skipped += n as u64;
    }
}

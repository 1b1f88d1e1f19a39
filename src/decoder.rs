//! The decoder (component I): owns all stream-wide state, parses the
//! marker and metadata chain once via [`FlacDecoder::initialize`], then
//! pulls one frame at a time via [`FlacDecoder::decode_frame`].
//!
//! This keeps a pull-driven shape rather than exposing a lazy sample
//! iterator: a caller that wants per-sample streaming wraps the frame
//! buffer itself.

use std::io;

use tracing::{debug, trace, warn};

use super::errors;
use super::frame::{self, FrameInfo};
use super::md5sum::Md5Builder;
use super::metadata::{self, MetadataBlockInfo, StreamInfo, VorbisComment};
use super::Result;

/// CRC verification policy. A mismatch is always logged via `tracing`;
/// whether it also fails the decode is controlled per-CRC here. Default
/// is to verify both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub verify_header_crc: bool,
    pub verify_frame_crc: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            verify_header_crc: true,
            verify_frame_crc: true,
        }
    }
}

/// One byte of lookahead over a [`std::io::Read`] source, used only to
/// answer `eos()` without consuming a byte the next real read would need.
/// Same lookahead idiom as [`super::bitstream::BitReader`]'s `peek_eof`,
/// promoted to the byte level since the decoder's `eos()` must survive
/// across distinct `BitReader`s constructed per frame.
struct PeekReader<R> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: io::Read> PeekReader<R> {
    fn new(inner: R) -> Self {
        PeekReader {
            inner,
            peeked: None,
        }
    }

    fn peek_eof(&mut self) -> io::Result<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte)? {
            0 => Ok(true),
            _ => {
                self.peeked = Some(byte[0]);
                Ok(false)
            }
        }
    }
}

impl<R: io::Read> io::Read for PeekReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            let rest = self.inner.read(&mut buf[1..])?;
            Ok(1 + rest)
        } else {
            self.inner.read(buf)
        }
    }
}

/// A pull-driven FLAC decoder over any [`std::io::Read`] byte source.
///
/// Construct with [`FlacDecoder::new`] (or [`FlacDecoder::with_config`] to
/// change CRC verification policy), call [`FlacDecoder::initialize`]
/// exactly once, then repeatedly call [`FlacDecoder::decode_frame`] until
/// [`FlacDecoder::eos`] reports true.
pub struct FlacDecoder<R> {
    reader: PeekReader<R>,
    config: DecoderConfig,
    stream_info: Option<StreamInfo>,
    vorbis_comment: Option<VorbisComment>,
    skipped_blocks: Vec<MetadataBlockInfo>,
    frame_info: Option<FrameInfo>,
    audio_buffer: Vec<i32>,
    md5: Md5Builder,
    frame_count: u64,
    sample_count: u64,
}

impl<R: io::Read> FlacDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        FlacDecoder {
            reader: PeekReader::new(reader),
            config,
            stream_info: None,
            vorbis_comment: None,
            skipped_blocks: Vec::new(),
            frame_info: None,
            audio_buffer: Vec::new(),
            md5: Md5Builder::new(),
            frame_count: 0,
            sample_count: 0,
        }
    }

    /// Reads the `fLaC` marker and the full metadata block chain. After
    /// this returns, [`FlacDecoder::stream_info`] is populated and the
    /// reader sits at the first frame's sync code.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self) -> Result<()> {
        metadata::read_marker(&mut self.reader)?;
        let parsed = metadata::read_metadata_chain(&mut self.reader)?;

        for block in &parsed.skipped_blocks {
            trace!(
                block_type = block.block_type,
                length = block.length,
                known = block.is_known_type,
                "skipped metadata block"
            );
        }

        let info = parsed
            .stream_info
            .clone()
            .expect("read_metadata_chain guarantees STREAMINFO is present");
        debug!(
            sample_rate = info.sample_rate,
            channels = info.channels,
            bits_per_sample = info.bits_per_sample,
            total_samples = info.total_samples,
            "parsed STREAMINFO"
        );

        self.stream_info = Some(info);
        self.vorbis_comment = parsed.vorbis_comment;
        self.skipped_blocks = parsed.skipped_blocks;
        Ok(())
    }

    /// Decodes exactly one frame. Replaces the contents of
    /// [`FlacDecoder::audio_buffer`] with its interleaved PCM samples and
    /// updates [`FlacDecoder::frame_info`].
    ///
    /// Precondition: `!self.eos()`. Postcondition:
    /// `audio_buffer().len() == frame_info().block_size * channels`.
    pub fn decode_frame(&mut self) -> Result<()> {
        if self.eos()? {
            return errors::invariant_violation("decode_frame called at end of stream");
        }

        let stream_info = self
            .stream_info
            .clone()
            .expect("initialize must be called before decode_frame");

        let (info, channels) = frame::decode_frame(
            &mut self.reader,
            &stream_info,
            self.config.verify_header_crc,
            self.config.verify_frame_crc,
        )
        .map_err(|err| {
            warn!(error = %err, "frame decode failed");
            err
        })?;

        if info.block_size < stream_info.min_block_size as u32
            || info.block_size > stream_info.max_block_size as u32
        {
            return errors::invariant_violation(
                "frame block size falls outside STREAMINFO's [min, max] range",
            );
        }

        let block_size = info.block_size as usize;
        for channel in &channels {
            if channel.len() != block_size {
                return errors::invariant_violation(
                    "decoded subframe sample count does not match the frame's block size",
                );
            }
        }

        self.audio_buffer.clear();
        self.audio_buffer.reserve(block_size * channels.len());
        for i in 0..block_size {
            for channel in &channels {
                self.audio_buffer.push(channel[i]);
            }
        }

        self.md5.update(&self.audio_buffer, info.bits_per_sample);
        self.frame_count += 1;
        self.sample_count += block_size as u64;

        trace!(
            frame_count = self.frame_count,
            block_size,
            frame_or_sample_number = info.frame_or_sample_number,
            "decoded frame"
        );

        self.frame_info = Some(info);
        Ok(())
    }

    /// True once the byte source has no more frames to offer. Consulted
    /// by `decode_frame`'s precondition; safe to call at any time once
    /// `initialize` has completed.
    pub fn eos(&mut self) -> Result<bool> {
        Ok(self.reader.peek_eof()?)
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    pub fn vorbis_comment(&self) -> Option<&VorbisComment> {
        self.vorbis_comment.as_ref()
    }

    /// Every metadata block the decoder walked past without interpreting
    /// (PADDING, APPLICATION, SEEKTABLE, CUESHEET, PICTURE, and unknown
    /// types), in stream order.
    pub fn skipped_metadata_blocks(&self) -> &[MetadataBlockInfo] {
        &self.skipped_blocks
    }

    pub fn frame_info(&self) -> Option<&FrameInfo> {
        self.frame_info.as_ref()
    }

    /// Interleaved PCM samples from the most recent `decode_frame` call,
    /// `channels * block_size` entries long. Overwritten by the next call.
    pub fn audio_buffer(&self) -> &[i32] {
        &self.audio_buffer
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Finalizes the MD5 accumulated over every sample decoded so far.
    /// Only meaningful once `eos()` is true; compare against
    /// `stream_info().md5_signature` to check the lossless round-trip.
    pub fn finalize_md5(self) -> [u8; 16] {
        self.md5.finalize()
    }
}

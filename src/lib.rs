//! `flacore` decodes FLAC (Free Lossless Audio Codec) bitstreams into PCM
//! samples.
//!
//! The decoder is pull-driven: a caller constructs a [`decoder::FlacDecoder`]
//! over any [`std::io::Read`] byte source, calls
//! [`decoder::FlacDecoder::initialize`] once to consume the `fLaC` marker and
//! the metadata blocks, and then repeatedly calls
//! [`decoder::FlacDecoder::decode_frame`] to pull one frame of interleaved
//! PCM samples at a time.
//!
//! ```no_run
//! use flacore::decoder::FlacDecoder;
//!
//! let file = std::fs::File::open("example.flac").unwrap();
//! let mut decoder = FlacDecoder::new(file);
//! decoder.initialize().unwrap();
//!
//! while !decoder.eos().unwrap() {
//!     decoder.decode_frame().unwrap();
//!     let _samples = decoder.audio_buffer();
//! }
//! ```

pub mod bitstream;
pub mod crc;
pub mod decoder;
pub mod errors;
pub mod frame;
pub mod io;
pub mod md5sum;
pub mod metadata;
pub mod predictor;
pub mod residual;
pub mod subframe;

/// Either `T` on success, or an [`errors::Error`] describing why decoding
/// could not continue.
pub type Result<T> = std::result::Result<T, errors::Error>;

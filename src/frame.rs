//! Frame header parsing, channel decorrelation, and the per-frame decode
//! driver that ties the header, subframe decoder, and CRC checks together
//! (components D and I).

use tracing::warn;

use super::bitstream::BitReader;
use super::crc::{Crc16Reader, Crc8Reader, CrcWidth};
use super::errors;
use super::io::ReadBuffer;
use super::metadata::StreamInfo;
use super::subframe;
use super::Result;

const FRAME_SYNC_CODE: u16 = 0b1111_1111_1111_10;

/// Whether every frame in the stream uses the same block size (`Fixed`,
/// frame number counts frames) or block size can vary frame to frame
/// (`Variable`, frame number counts samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingStrategy {
    Fixed,
    Variable,
}

/// How the frame's channels map onto the subframes that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssignment {
    /// Every channel is coded independently; the value is the channel count.
    Independent(u8),
    LeftSide,
    RightSide,
    MidSide,
}

impl ChannelAssignment {
    pub fn channel_count(self) -> u8 {
        match self {
            ChannelAssignment::Independent(n) => n,
            ChannelAssignment::LeftSide | ChannelAssignment::RightSide | ChannelAssignment::MidSide => 2,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub blocking_strategy: BlockingStrategy,
    pub block_size: u32,
    pub sample_rate: u32,
    pub channel_assignment: ChannelAssignment,
    pub bits_per_sample: u8,
    /// Frame number (`Fixed` strategy) or first sample number (`Variable`).
    pub frame_or_sample_number: u64,
    /// Whether the header's CRC-8 byte matched what was computed, regardless
    /// of whether `verify_header_crc` was set to fail the decode on mismatch.
    pub crc_header_ok: bool,
}

fn decode_block_size_code<R: ReadBuffer>(code: u8, bits: &mut BitReader<R>) -> Result<u32> {
    match code {
        0b0000 => errors::malformed_frame_header("reserved block size code"),
        0b0001 => Ok(192),
        0b0010..=0b0101 => Ok(576 << (code - 0b0010)),
        0b0110 => Ok(bits.read_unsigned(8)? as u32 + 1),
        0b0111 => Ok(bits.read_unsigned(16)? as u32 + 1),
        0b1000..=0b1111 => Ok(256 << (code - 0b1000)),
        _ => unreachable!("block size code is a 4-bit value"),
    }
}

fn decode_sample_rate_code<R: ReadBuffer>(
    code: u8,
    stream_info: &StreamInfo,
    bits: &mut BitReader<R>,
) -> Result<u32> {
    Ok(match code {
        0b0000 => stream_info.sample_rate,
        0b0001 => 88_200,
        0b0010 => 176_400,
        0b0011 => 192_000,
        0b0100 => 8_000,
        0b0101 => 16_000,
        0b0110 => 22_050,
        0b0111 => 24_000,
        0b1000 => 32_000,
        0b1001 => 44_100,
        0b1010 => 48_000,
        0b1011 => 96_000,
        0b1100 => bits.read_unsigned(8)? as u32 * 1_000,
        0b1101 => bits.read_unsigned(16)? as u32,
        0b1110 => bits.read_unsigned(16)? as u32 * 10,
        0b1111 => return errors::malformed_frame_header("invalid sample rate code"),
        _ => unreachable!("sample rate code is a 4-bit value"),
    })
}

fn decode_channel_assignment(code: u8) -> Result<ChannelAssignment> {
    match code {
        0..=7 => Ok(ChannelAssignment::Independent(code + 1)),
        8 => Ok(ChannelAssignment::LeftSide),
        9 => Ok(ChannelAssignment::RightSide),
        10 => Ok(ChannelAssignment::MidSide),
        _ => errors::malformed_frame_header("reserved channel assignment code"),
    }
}

fn decode_sample_size_code(code: u8, stream_info: &StreamInfo) -> Result<u8> {
    match code {
        0b000 => Ok(stream_info.bits_per_sample),
        0b001 => Ok(8),
        0b010 => Ok(12),
        0b100 => Ok(16),
        0b101 => Ok(20),
        0b110 => Ok(24),
        0b111 => Ok(32),
        0b011 => errors::malformed_frame_header("reserved sample size code"),
        _ => unreachable!("sample size code is a 3-bit value"),
    }
}

/// Parses a frame header, checking its CRC-8 footer if `verify_crc` is set.
/// `reader` must be positioned at the first byte of the sync code.
fn read_frame_header<R: ReadBuffer>(
    reader: &mut R,
    stream_info: &StreamInfo,
    verify_crc: bool,
) -> Result<FrameInfo> {
    let mut crc_reader = Crc8Reader::new(reader);
    let mut bits = BitReader::new(&mut crc_reader);

    let sync = bits.read_unsigned(14)? as u16;
    if sync != FRAME_SYNC_CODE {
        return errors::malformed_frame_header("frame sync code mismatch");
    }
    if bits.read_unsigned(1)? != 0 {
        return errors::malformed_frame_header("non-zero reserved bit in frame header");
    }
    let blocking_strategy = if bits.read_unsigned(1)? == 0 {
        BlockingStrategy::Fixed
    } else {
        BlockingStrategy::Variable
    };

    let block_size_code = bits.read_unsigned(4)? as u8;
    let sample_rate_code = bits.read_unsigned(4)? as u8;
    let channel_code = bits.read_unsigned(4)? as u8;
    let sample_size_code = bits.read_unsigned(3)? as u8;
    if bits.read_unsigned(1)? != 0 {
        return errors::malformed_frame_header("non-zero reserved bit in frame header");
    }

    bits.align_to_byte();
    let frame_or_sample_number = bits.read_utf8_int()?;

    let block_size = decode_block_size_code(block_size_code, &mut bits)?;
    let sample_rate = decode_sample_rate_code(sample_rate_code, stream_info, &mut bits)?;
    let channel_assignment = decode_channel_assignment(channel_code)?;
    let bits_per_sample = decode_sample_size_code(sample_size_code, stream_info)?;

    debug_assert!(bits.is_aligned(), "frame header fields are always byte-aligned");
    drop(bits);

    // The CRC-8 byte itself is not part of the checksum it carries, so it
    // is read directly from the header CRC reader's input (still updating
    // the frame-wide CRC-16 in the process) rather than through `bits`.
    let computed = crc_reader.crc();
    let header_crc = crc_reader.get_input().read_u8()?;
    let crc_header_ok = computed.value() == header_crc;
    if !crc_header_ok {
        warn!(computed = computed.value(), declared = header_crc, "frame header CRC-8 mismatch");
        if verify_crc {
            return errors::malformed_frame_header("frame header CRC-8 mismatch");
        }
    }

    Ok(FrameInfo {
        blocking_strategy,
        block_size,
        sample_rate,
        channel_assignment,
        bits_per_sample,
        frame_or_sample_number,
        crc_header_ok,
    })
}

/// Reconstructs left/right PCM from a left/side coded channel pair.
///
/// `side` carries `bits_per_sample + 1` bits, so its raw decoded values
/// are passed in as `i64`; the reconstructed `left`/`right` always fit
/// back within the frame's nominal bit depth.
pub fn decode_left_side(left: &[i64], side: &[i64], out_left: &mut [i32], out_right: &mut [i32]) {
    for i in 0..left.len() {
        out_left[i] = left[i] as i32;
        out_right[i] = (left[i] - side[i]) as i32;
    }
}

/// Reconstructs left/right PCM from a right/side coded channel pair.
pub fn decode_right_side(right: &[i64], side: &[i64], out_left: &mut [i32], out_right: &mut [i32]) {
    for i in 0..right.len() {
        out_left[i] = (right[i] + side[i]) as i32;
        out_right[i] = right[i] as i32;
    }
}

/// Reconstructs left/right PCM from a mid/side coded channel pair.
pub fn decode_mid_side(mid: &[i64], side: &[i64], out_left: &mut [i32], out_right: &mut [i32]) {
    for i in 0..mid.len() {
        let s = side[i];
        let m = (mid[i] << 1) | (s & 1);
        out_left[i] = ((m + s) >> 1) as i32;
        out_right[i] = ((m - s) >> 1) as i32;
    }
}

/// Decodes one entire frame: header, every subframe, inter-channel
/// decorrelation, and the frame-wide CRC-16 footer.
///
/// Returns the frame header and one `Vec<i32>` of decoded samples per
/// output channel (already decorrelated to left/right where applicable).
pub fn decode_frame<R: ReadBuffer>(
    reader: &mut R,
    stream_info: &StreamInfo,
    verify_header_crc: bool,
    verify_frame_crc: bool,
) -> Result<(FrameInfo, Vec<Vec<i32>>)> {
    let mut crc16_reader = Crc16Reader::new(reader);

    let info = read_frame_header(&mut crc16_reader, stream_info, verify_header_crc)?;
    let block_size = info.block_size as usize;

    let channels = info.channel_assignment.channel_count();
    let mut bits = BitReader::new(&mut crc16_reader);
    let mut decoded: Vec<Vec<i64>> = Vec::with_capacity(channels as usize);
    for ch in 0..channels {
        let bps = match info.channel_assignment {
            ChannelAssignment::LeftSide if ch == 1 => info.bits_per_sample + 1,
            ChannelAssignment::RightSide if ch == 0 => info.bits_per_sample + 1,
            ChannelAssignment::MidSide if ch == 1 => info.bits_per_sample + 1,
            _ => info.bits_per_sample,
        };
        decoded.push(subframe::decode_subframe(&mut bits, block_size, bps)?);
    }

    bits.align_to_byte();
    let mut reader = bits.into_inner();

    let mut output = vec![vec![0i32; block_size]; channels as usize];
    match info.channel_assignment {
        ChannelAssignment::Independent(_) => {
            for (src, dst) in decoded.iter().zip(output.iter_mut()) {
                for (s, d) in src.iter().zip(dst.iter_mut()) {
                    *d = *s as i32;
                }
            }
        }
        ChannelAssignment::LeftSide => {
            let (l, r) = output.split_at_mut(1);
            decode_left_side(&decoded[0], &decoded[1], &mut l[0], &mut r[0]);
        }
        ChannelAssignment::RightSide => {
            let (l, r) = output.split_at_mut(1);
            decode_right_side(&decoded[0], &decoded[1], &mut l[0], &mut r[0]);
        }
        ChannelAssignment::MidSide => {
            let (l, r) = output.split_at_mut(1);
            decode_mid_side(&decoded[0], &decoded[1], &mut l[0], &mut r[0]);
        }
    }

    // As with the header CRC-8 byte, the two footer CRC-16 bytes are not
    // themselves part of the checksum they carry.
    let computed = reader.crc();
    let footer_crc = reader.get_input().read_be_u16()?;
    if computed.value() != footer_crc {
        warn!(computed = computed.value(), declared = footer_crc, "frame footer CRC-16 mismatch");
        if verify_frame_crc {
            return errors::invariant_violation("frame CRC-16 mismatch");
        }
    }

    Ok((info, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_info() -> StreamInfo {
        StreamInfo {
            min_block_size: 4096,
            max_block_size: 4096,
            min_frame_size: 0,
            max_frame_size: 0,
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
            total_samples: 0,
            md5_signature: [0; 16],
        }
    }

    #[test]
    fn mid_side_reconstructs_left_right() {
        // left=10, right=4 -> mid=(10+4)>>1=7, side=10-4=6
        let mid = [7i64];
        let side = [6i64];
        let mut l = [0i32];
        let mut r = [0i32];
        decode_mid_side(&mid, &side, &mut l, &mut r);
        assert_eq!(l[0], 10);
        assert_eq!(r[0], 4);
    }

    #[test]
    fn left_side_reconstructs_right() {
        let left = [10i64];
        let side = [6i64];
        let mut l = [0i32];
        let mut r = [0i32];
        decode_left_side(&left, &side, &mut l, &mut r);
        assert_eq!(l[0], 10);
        assert_eq!(r[0], 4);
    }

    #[test]
    fn right_side_reconstructs_left() {
        let right = [4i64];
        let side = [6i64];
        let mut l = [0i32];
        let mut r = [0i32];
        decode_right_side(&right, &side, &mut l, &mut r);
        assert_eq!(l[0], 10);
        assert_eq!(r[0], 4);
    }

    #[test]
    fn block_size_code_table() {
        let empty: &[u8] = &[];
        let mut bits = BitReader::new(empty);
        assert_eq!(decode_block_size_code(0b0001, &mut bits).unwrap(), 192);
        assert_eq!(decode_block_size_code(0b0011, &mut bits).unwrap(), 1152);
        assert_eq!(decode_block_size_code(0b1000, &mut bits).unwrap(), 256);
        assert_eq!(decode_block_size_code(0b1111, &mut bits).unwrap(), 32768);
    }

    #[test]
    fn sample_rate_code_falls_back_to_stream_info() {
        let empty: &[u8] = &[];
        let mut bits = BitReader::new(empty);
        let info = stream_info();
        assert_eq!(
            decode_sample_rate_code(0b0000, &info, &mut bits).unwrap(),
            44_100
        );
    }

    #[test]
    fn channel_assignment_table() {
        assert_eq!(
            decode_channel_assignment(1).unwrap(),
            ChannelAssignment::Independent(2)
        );
        assert_eq!(decode_channel_assignment(8).unwrap(), ChannelAssignment::LeftSide);
        assert_eq!(decode_channel_assignment(10).unwrap(), ChannelAssignment::MidSide);
        assert!(decode_channel_assignment(11).is_err());
    }

    #[test]
    fn sample_size_code_table() {
        let info = stream_info();
        assert_eq!(decode_sample_size_code(0b000, &info).unwrap(), 16);
        assert_eq!(decode_sample_size_code(0b001, &info).unwrap(), 8);
        assert_eq!(decode_sample_size_code(0b110, &info).unwrap(), 24);
        assert_eq!(decode_sample_size_code(0b111, &info).unwrap(), 32);
        assert!(decode_sample_size_code(0b011, &info).is_err());
    }
}

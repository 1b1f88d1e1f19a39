//! Partitioned Rice-coded residual decoding (component F).
//!
//! A residual is split into `2^partition_order` partitions of (almost)
//! equal size, each carrying its own Rice parameter so the entropy coder
//! can adapt to local changes in signal energy. A partition may instead be
//! escaped to raw fixed-width samples when no Rice parameter fits it well.

use super::bitstream::BitReader;
use super::errors;
use super::io::ReadBuffer;
use super::Result;

const RICE_ESCAPE_METHOD_0: u64 = 0b1111;
const RICE_ESCAPE_METHOD_1: u64 = 0b1_1111;

/// Decodes `block_size - predictor_order` residual values: the samples a
/// FIXED or LPC subframe could not predict exactly.
pub fn decode_residual<R: ReadBuffer>(
    bits: &mut BitReader<R>,
    block_size: usize,
    predictor_order: usize,
) -> Result<Vec<i64>> {
    let method = bits.read_unsigned(2)?;
    let (param_bits, escape_code) = match method {
        0 => (4, RICE_ESCAPE_METHOD_0),
        1 => (5, RICE_ESCAPE_METHOD_1),
        _ => return errors::malformed_residual("reserved residual coding method"),
    };

    let partition_order = bits.read_unsigned(4)? as u32;
    let partition_count = 1usize << partition_order;

    if partition_order > 0 && block_size % partition_count != 0 {
        return errors::malformed_residual("block size is not divisible by the partition count");
    }
    let samples_per_partition = block_size / partition_count;
    if samples_per_partition < predictor_order && partition_count > 1 {
        return errors::malformed_residual("first partition cannot hold the predictor warmup");
    }
    if samples_per_partition < predictor_order {
        return errors::malformed_residual("partition order incompatible with predictor order");
    }

    let mut residual = Vec::with_capacity(block_size - predictor_order);
    for partition in 0..partition_count {
        let count = if partition == 0 {
            samples_per_partition - predictor_order
        } else {
            samples_per_partition
        };

        let rice_param = bits.read_unsigned(param_bits)?;
        if rice_param == escape_code {
            let raw_bits = bits.read_unsigned(5)? as u32;
            for _ in 0..count {
                residual.push(bits.read_signed(raw_bits)?);
            }
        } else {
            for _ in 0..count {
                residual.push(bits.read_rice_signed(rice_param as u32)?);
            }
        }
    }

    Ok(residual)
}

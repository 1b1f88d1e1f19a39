//! Per-channel subframe decoding (component E): header dispatch (type
//! code and wasted-bits prefix), warm-up samples, handing the residual
//! tail off to [`super::residual`], and reconstruction via
//! [`super::predictor`].

use super::bitstream::BitReader;
use super::errors;
use super::io::ReadBuffer;
use super::predictor;
use super::residual;
use super::Result;

const TYPE_CONSTANT: u8 = 0b000000;
const TYPE_VERBATIM: u8 = 0b000001;
const MAX_LPC_ORDER: usize = 32;

/// Decodes one subframe of `block_size` samples at `bits_per_sample` bits
/// wide (already adjusted by the caller for joint-stereo side channels).
/// Wasted bits are re-applied before returning, so every sample in the
/// result is at the subframe's nominal bit depth.
pub fn decode_subframe<R: ReadBuffer>(
    bits: &mut BitReader<R>,
    block_size: usize,
    bits_per_sample: u8,
) -> Result<Vec<i64>> {
    if bits.read_unsigned(1)? != 0 {
        return errors::malformed_subframe("non-zero subframe padding bit");
    }
    let type_code = bits.read_unsigned(6)? as u8;

    let wasted_bits = if bits.read_unsigned(1)? != 0 {
        bits.read_unary()? + 1
    } else {
        0
    };
    if wasted_bits >= bits_per_sample as u32 {
        return errors::malformed_subframe("wasted bits prefix leaves no data bits");
    }
    let effective_bps = bits_per_sample as u32 - wasted_bits;

    let mut samples = match type_code {
        TYPE_CONSTANT => decode_constant(bits, block_size, effective_bps)?,
        TYPE_VERBATIM => decode_verbatim(bits, block_size, effective_bps)?,
        code @ 0b001_000..=0b001_111 => {
            let order = (code & 0b000_111) as usize;
            if order > 4 {
                return errors::malformed_subframe("reserved fixed-predictor order");
            }
            decode_fixed(bits, block_size, effective_bps, order)?
        }
        code if code & 0b100_000 != 0 => {
            let order = (code & 0b011_111) as usize + 1;
            decode_lpc(bits, block_size, effective_bps, order)?
        }
        _ => return errors::malformed_subframe("reserved subframe type code"),
    };

    if wasted_bits > 0 {
        for sample in samples.iter_mut() {
            *sample <<= wasted_bits;
        }
    }

    Ok(samples)
}

fn decode_constant<R: ReadBuffer>(
    bits: &mut BitReader<R>,
    block_size: usize,
    bps: u32,
) -> Result<Vec<i64>> {
    let value = bits.read_signed(bps)?;
    Ok(vec![value; block_size])
}

fn decode_verbatim<R: ReadBuffer>(
    bits: &mut BitReader<R>,
    block_size: usize,
    bps: u32,
) -> Result<Vec<i64>> {
    let mut samples = Vec::with_capacity(block_size);
    for _ in 0..block_size {
        samples.push(bits.read_signed(bps)?);
    }
    Ok(samples)
}

fn read_warmup<R: ReadBuffer>(bits: &mut BitReader<R>, order: usize, bps: u32) -> Result<Vec<i64>> {
    let mut samples = Vec::with_capacity(order);
    for _ in 0..order {
        samples.push(bits.read_signed(bps)?);
    }
    Ok(samples)
}

fn finish_reconstruction(samples: Vec<i64>, block_size: usize) -> Result<Vec<i64>> {
    if samples.len() != block_size {
        return errors::invariant_violation("reconstructed subframe sample count mismatch");
    }
    Ok(samples)
}

fn decode_fixed<R: ReadBuffer>(
    bits: &mut BitReader<R>,
    block_size: usize,
    bps: u32,
    order: usize,
) -> Result<Vec<i64>> {
    if order > block_size {
        return errors::malformed_subframe("fixed predictor order exceeds block size");
    }
    let mut samples = read_warmup(bits, order, bps)?;
    samples.extend(residual::decode_residual(bits, block_size, order)?);
    predictor::predict_fixed(order, &mut samples)?;
    finish_reconstruction(samples, block_size)
}

fn decode_lpc<R: ReadBuffer>(
    bits: &mut BitReader<R>,
    block_size: usize,
    bps: u32,
    order: usize,
) -> Result<Vec<i64>> {
    if order == 0 || order > MAX_LPC_ORDER || order > block_size {
        return errors::malformed_subframe("invalid LPC predictor order");
    }
    let mut samples = read_warmup(bits, order, bps)?;

    let precision_code = bits.read_unsigned(4)? as u32;
    if precision_code == 0b1111 {
        return errors::malformed_subframe("reserved LPC coefficient precision code");
    }
    let precision = precision_code + 1;
    let shift = bits.read_signed(5)? as i32;

    let mut coefficients = Vec::with_capacity(order);
    for _ in 0..order {
        coefficients.push(bits.read_signed(precision)?);
    }

    samples.extend(residual::decode_residual(bits, block_size, order)?);
    predictor::predict_lpc(&coefficients, shift, &mut samples);
    finish_reconstruction(samples, block_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs a sequence of (value, bit width) pairs MSB-first into bytes.
    fn pack(fields: &[(u64, u32)]) -> Vec<u8> {
        let mut acc: u64 = 0;
        let mut acc_bits: u32 = 0;
        let mut out = Vec::new();
        for &(value, width) in fields {
            for i in (0..width).rev() {
                let bit = (value >> i) & 1;
                acc = (acc << 1) | bit;
                acc_bits += 1;
                if acc_bits == 8 {
                    out.push(acc as u8);
                    acc = 0;
                    acc_bits = 0;
                }
            }
        }
        if acc_bits > 0 {
            acc <<= 8 - acc_bits;
            out.push(acc as u8);
        }
        out
    }

    fn signed_field(value: i64, width: u32) -> (u64, u32) {
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        ((value as u64) & mask, width)
    }

    #[test]
    fn constant_subframe_fills_block() {
        // padding=0, type=000000, no wasted bits, value=0 at 16 bits.
        let data = pack(&[(0, 1), (0b000000, 6), (0, 1), signed_field(0, 16)]);
        let mut src: &[u8] = &data;
        let mut bits = BitReader::new(&mut src);
        let samples = decode_subframe(&mut bits, 8192, 16).unwrap();
        assert_eq!(samples.len(), 8192);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn verbatim_subframe_round_trips_samples() {
        let values: [i64; 8] = [0, 1, -1, 127, -128, 42, -42, 0];
        let mut fields = vec![(0u64, 1), (0b000001, 6), (0, 1)];
        for &v in &values {
            fields.push(signed_field(v, 8));
        }
        let data = pack(&fields);
        let mut src: &[u8] = &data;
        let mut bits = BitReader::new(&mut src);
        let samples = decode_subframe(&mut bits, 8, 8).unwrap();
        assert_eq!(samples, values.to_vec());
    }

    #[test]
    fn wasted_bits_are_reapplied_after_decode() {
        // CONSTANT subframe, wasted-bits flag set, unary count of 2 zeros
        // (k=3), value read at bps-k=13 bits as 1, then left-shifted by 3.
        let data = pack(&[(0, 1), (0b000000, 6), (1, 1), (0b001, 3), signed_field(1, 13)]);
        let mut src: &[u8] = &data;
        let mut bits = BitReader::new(&mut src);
        let samples = decode_subframe(&mut bits, 4, 16).unwrap();
        assert_eq!(samples, vec![8, 8, 8, 8]);
    }

    #[test]
    fn reserved_type_code_is_rejected() {
        let data = pack(&[(0, 1), (0b000010, 6), (0, 1)]);
        let mut src: &[u8] = &data;
        let mut bits = BitReader::new(&mut src);
        assert!(decode_subframe(&mut bits, 4, 8).is_err());
    }

    #[test]
    fn reserved_fixed_order_is_rejected() {
        let data = pack(&[(0, 1), (0b001_101, 6), (0, 1)]);
        let mut src: &[u8] = &data;
        let mut bits = BitReader::new(&mut src);
        assert!(decode_subframe(&mut bits, 4, 8).is_err());
    }
}

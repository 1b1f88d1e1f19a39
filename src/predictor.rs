//! Fixed and LPC predictor reconstruction (component G).
//!
//! The subframe decoder writes warm-up samples into `buffer[0..order]`
//! verbatim and the Rice-decoded residual into `buffer[order..]`; the
//! functions here turn that residual into the reconstructed signal by
//! adding the predicted value back in, in place.

use super::errors;
use super::Result;

/// Applies one of FLAC's five hard-coded fixed predictors in place.
pub fn predict_fixed(order: usize, buffer: &mut [i64]) -> Result<()> {
    match order {
        0 => {}
        1 => {
            for i in 1..buffer.len() {
                buffer[i] += buffer[i - 1];
            }
        }
        2 => {
            for i in 2..buffer.len() {
                buffer[i] += 2 * buffer[i - 1] - buffer[i - 2];
            }
        }
        3 => {
            for i in 3..buffer.len() {
                buffer[i] += 3 * buffer[i - 1] - 3 * buffer[i - 2] + buffer[i - 3];
            }
        }
        4 => {
            for i in 4..buffer.len() {
                buffer[i] += 4 * buffer[i - 1] - 6 * buffer[i - 2] + 4 * buffer[i - 3] - buffer[i - 4];
            }
        }
        _ => return errors::malformed_subframe("fixed predictor order must be 0..=4"),
    }
    Ok(())
}

/// Applies the general linear predictor in place.
///
/// `coefficients[j]` multiplies `x[i-1-j]`, matching the order FLAC's LPC
/// subframe stores them in. The dot product accumulates in `i64`, wide
/// enough that a 32-bit sample times a 15-bit coefficient, summed over the
/// maximum order of 32, cannot overflow. A negative shift (legal on the
/// wire per the FLAC format, vanishingly rare in encoders actually seen)
/// is clamped to zero rather than turned into a left shift; see
/// DESIGN.md for the rationale.
pub fn predict_lpc(coefficients: &[i64], shift: i32, buffer: &mut [i64]) {
    let order = coefficients.len();
    let shift = shift.max(0) as u32;
    for i in order..buffer.len() {
        let mut prediction: i64 = 0;
        for (j, &c) in coefficients.iter().enumerate() {
            prediction += c * buffer[i - 1 - j];
        }
        buffer[i] += prediction >> shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_order_0_is_identity() {
        let mut buf = vec![1, 2, 3];
        predict_fixed(0, &mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[test]
    fn fixed_order_1_running_sum() {
        // warm-up [100], residuals [1, 1, 1, 1] -> [100, 101, 102, 103, 104]
        let mut buf = vec![100, 1, 1, 1, 1];
        predict_fixed(1, &mut buf).unwrap();
        assert_eq!(buf, vec![100, 101, 102, 103, 104]);
    }

    #[test]
    fn fixed_order_2_linear_ramp() {
        // warm-up [0, 1], residuals [0, 0, 0] -> [0, 1, 2, 3, 4]
        let mut buf = vec![0, 1, 0, 0, 0];
        predict_fixed(2, &mut buf).unwrap();
        assert_eq!(buf, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn fixed_order_5_is_reserved() {
        let mut buf = vec![0; 5];
        assert!(predict_fixed(5, &mut buf).is_err());
    }

    #[test]
    fn lpc_order_2_matches_fixed_order_2() {
        // coefficients [2, -1], shift 0, warm-up [0, 1], residuals all 0
        // reproduces the same linear ramp as the FIXED order-2 predictor.
        let mut buf = vec![0, 1, 0, 0, 0, 0];
        predict_lpc(&[2, -1], 0, &mut buf);
        assert_eq!(buf, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn lpc_shift_clamps_negative_to_zero() {
        let mut buf = vec![4, 0];
        predict_lpc(&[1], -3, &mut buf);
        assert_eq!(buf, vec![4, 4]);
    }

    #[test]
    fn lpc_accumulates_wide_without_overflow() {
        // Max-magnitude 32-bit samples times near-max coefficients over a
        // full order-32 predictor must not overflow an i64 accumulator.
        let coefficients = vec![i16::MAX as i64; 32];
        let mut buf = vec![i32::MIN as i64; 33];
        predict_lpc(&coefficients, 0, &mut buf);
        // No panic is the test; the exact value only needs to fit in i64.
        assert!(buf[32] != 0 || coefficients.iter().all(|&c| c == 0));
    }
}

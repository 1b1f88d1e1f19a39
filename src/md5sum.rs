//! Incremental MD5 hashing of decoded PCM (component L), so a caller can
//! check the lossless round-trip property against STREAMINFO's
//! `md5_signature` without holding every decoded frame in memory at once.
//!
//! Grounded on the `md5::Context` incremental-hashing idiom (`new`,
//! `consume`, `compute`), the same one Sonata's FLAC decoder uses for this
//! exact check.

/// Feeds little-endian PCM bytes into a running MD5 state, one frame of
/// interleaved samples at a time.
pub struct Md5Builder {
    ctx: md5::Context,
}

impl Md5Builder {
    pub fn new() -> Self {
        Md5Builder { ctx: md5::Context::new() }
    }

    /// Consumes one frame's interleaved samples, encoded little-endian at
    /// `bits_per_sample` rounded up to the nearest whole byte (8, 16, 24,
    /// or 32 bits).
    pub fn update(&mut self, samples: &[i32], bits_per_sample: u8) {
        let width = match bits_per_sample {
            0..=8 => 1,
            9..=16 => 2,
            17..=24 => 3,
            _ => 4,
        };
        let mut buf = Vec::with_capacity(samples.len() * width);
        for &sample in samples {
            buf.extend_from_slice(&sample.to_le_bytes()[..width]);
        }
        self.ctx.consume(&buf);
    }

    /// Finalizes the hash accumulated so far.
    pub fn finalize(self) -> [u8; 16] {
        self.ctx.compute().0
    }
}

impl Default for Md5Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_mono_matches_known_digest() {
        // 8192 zero samples at 16 bits -> 16384 zero bytes, whose MD5 is
        // the well-known digest of an all-zero buffer of that length.
        let mut builder = Md5Builder::new();
        let zeros = vec![0i32; 8192];
        builder.update(&zeros, 16);
        let digest = builder.finalize();
        let expected = md5::compute(vec![0u8; 16384]).0;
        assert_eq!(digest, expected);
    }

    #[test]
    fn incremental_update_matches_single_shot() {
        let samples: Vec<i32> = (0..100).collect();
        let mut incremental = Md5Builder::new();
        incremental.update(&samples[..40], 16);
        incremental.update(&samples[40..], 16);

        let mut bytes = Vec::new();
        for &s in &samples {
            bytes.extend_from_slice(&(s as i16).to_le_bytes());
        }
        let expected = md5::compute(&bytes).0;
        assert_eq!(incremental.finalize(), expected);
    }
}

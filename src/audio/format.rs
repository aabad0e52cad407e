//! PCM sample format conversions.
//!
//! The recorder emits raw signed-16-bit little-endian mono PCM on its stdout.
//! Whisper wants normalised `f32` samples in `[-1, 1]`.  These helpers are the
//! only place the wire format is interpreted — everything downstream works on
//! typed samples.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Divisor for int16 → float32 normalisation.
///
/// Must be exactly `32768.0` — the transcription contract expects
/// `sample_float = sample_int16 / 32768.0`, so `i16::MIN` maps to `-1.0`
/// and `i16::MAX` to just under `1.0`.
pub const I16_SCALE: f32 = 32768.0;

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Normalise a single 16-bit sample to `f32`.
#[inline]
pub fn sample_to_f32(sample: i16) -> f32 {
    sample as f32 / I16_SCALE
}

/// Normalise a buffer of 16-bit samples to `f32`.
pub fn samples_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().copied().map(sample_to_f32).collect()
}

/// Decode little-endian byte pairs into 16-bit samples.
///
/// `bytes.len()` must be even — the capture loop carries a trailing odd byte
/// over to the next chunk before calling this (a 512-byte read from a pipe is
/// not guaranteed to land on a sample boundary).
///
/// # Panics
///
/// Panics in debug builds when `bytes.len()` is odd.
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    debug_assert!(bytes.len() % 2 == 0, "sample byte stream split mid-sample");
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Scale constant ----------------------------------------------------

    #[test]
    fn scale_constant_is_exact() {
        assert_eq!(I16_SCALE, 32768.0);
    }

    #[test]
    fn min_sample_maps_to_minus_one() {
        assert_eq!(sample_to_f32(i16::MIN), -1.0);
    }

    #[test]
    fn max_sample_maps_just_below_one() {
        let v = sample_to_f32(i16::MAX);
        assert!(v < 1.0);
        assert_eq!(v, 32767.0 / 32768.0);
    }

    #[test]
    fn zero_maps_to_zero() {
        assert_eq!(sample_to_f32(0), 0.0);
    }

    /// `round(float * 32768) == int16` for every representable value —
    /// conversion is invertible up to quantisation.
    #[test]
    fn conversion_is_invertible() {
        for s in [i16::MIN, -12345, -1, 0, 1, 255, 12345, i16::MAX] {
            let f = sample_to_f32(s);
            assert_eq!((f * I16_SCALE).round() as i32, s as i32);
        }
    }

    // ---- Byte decoding -----------------------------------------------------

    #[test]
    fn bytes_decode_little_endian() {
        // 0x0100 = 256, 0xFFFF = -1
        let samples = bytes_to_samples(&[0x00, 0x01, 0xFF, 0xFF]);
        assert_eq!(samples, vec![256, -1]);
    }

    #[test]
    fn empty_bytes_decode_to_empty() {
        assert_eq!(bytes_to_samples(&[]), Vec::<i16>::new());
    }

    #[test]
    fn buffer_conversion_preserves_order() {
        let samples = vec![1i16, -2, 3, -4];
        let floats = samples_to_f32(&samples);
        assert_eq!(floats.len(), 4);
        assert_eq!(floats[0], 1.0 / 32768.0);
        assert_eq!(floats[1], -2.0 / 32768.0);
        assert_eq!(floats[3], -4.0 / 32768.0);
    }
}

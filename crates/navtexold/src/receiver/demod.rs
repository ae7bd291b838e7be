//! Mark/space discriminator with automatic threshold correction
//!
//! Turns each pair of filtered mark/space magnitudes into one signed
//! soft bit. The discriminator tracks a signal envelope and a noise
//! floor per tone and applies W7AY's automatic threshold correction,
//! <http://www.w7ay.net/site/Technical/ATC/>, which keeps the
//! mark/space decision unbiased as the tones fade independently.

/// Single-pole IIR averager
///
/// Returns the decayed average; the caller must store the result
/// back. The previous average is not updated in place.
#[inline]
pub(crate) fn decay_avg(avg: f64, value: f64, count: f64) -> f64 {
    avg + (value - avg) / count
}

/// Mark/space discriminator
///
/// The output of [`input()`](AtcDiscriminator::input) is a soft bit:
///
/// * `output > 0` → mark
/// * `output < 0` → space
///
/// The magnitude is the natural log of the ATC logic level, truncated
/// to an integer, so downstream consumers can tell well-decoded
/// samples from marginal ones.
#[derive(Clone, Debug)]
pub struct AtcDiscriminator {
    bit_samples: f64,
    mark_env: f64,
    mark_noise: f64,
    space_env: f64,
    space_noise: f64,
}

impl AtcDiscriminator {
    /// New discriminator for `bit_samples` samples per bit
    pub fn new(bit_samples: f64) -> Self {
        Self {
            bit_samples,
            mark_env: 0.0,
            mark_noise: 0.0,
            space_env: 0.0,
            space_noise: 0.0,
        }
    }

    /// Reset envelope and noise state
    pub fn reset(&mut self) {
        self.mark_env = 0.0;
        self.mark_noise = 0.0;
        self.space_env = 0.0;
        self.space_noise = 0.0;
    }

    /// Process one filtered sample pair into a soft bit
    ///
    /// `mark_abs` and `space_abs` are the magnitudes of the mark and
    /// space low-pass outputs. Non-finite magnitudes are treated as a
    /// dropped sample and produce a zero-confidence bit.
    pub fn input(&mut self, mark_abs: f64, space_abs: f64) -> i32 {
        if !mark_abs.is_finite() || !space_abs.is_finite() {
            return 0;
        }

        self.mark_env = self.envelope_decay(self.mark_env, mark_abs);
        self.mark_noise = self.noise_decay(self.mark_noise, mark_abs);
        self.space_env = self.envelope_decay(self.space_env, space_abs);
        self.space_noise = self.noise_decay(self.space_noise, space_abs);

        let noise_floor = (self.mark_noise + self.space_noise) / 2.0;

        // clip both tones to their envelope and the common floor
        let mark_abs = mark_abs.min(self.mark_env).max(noise_floor);
        let space_abs = space_abs.min(self.space_env).max(noise_floor);

        let mark_rel = self.mark_env - noise_floor;
        let space_rel = self.space_env - noise_floor;
        let logic_level = (mark_abs - noise_floor) * mark_rel
            - (space_abs - noise_floor) * space_rel
            - 0.5 * (mark_rel * mark_rel - space_rel * space_rel);

        // log-compress so the bit clock and FEC see which samples
        // decoded well and which barely cleared the threshold
        let mut soft = (1.0 + logic_level.abs()).ln() as i32;
        if logic_level < 0.0 {
            soft = -soft;
        }
        soft
    }

    // envelope average decays fast up, slow down
    fn envelope_decay(&self, avg: f64, value: f64) -> f64 {
        let count = if value > avg {
            self.bit_samples / 4.0
        } else {
            self.bit_samples * 16.0
        };
        decay_avg(avg, value, count)
    }

    // noise average decays fast down, slow up
    fn noise_decay(&self, avg: f64, value: f64) -> f64 {
        let count = if value < avg {
            self.bit_samples / 4.0
        } else {
            self.bit_samples * 48.0
        };
        decay_avg(avg, value, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_decay_avg() {
        // fast counts converge quickly, slow counts barely move
        let avg = decay_avg(0.0, 100.0, 2.0);
        assert_approx_eq!(avg, 50.0);

        let avg = decay_avg(10.0, 10.0, 64.0);
        assert_approx_eq!(avg, 10.0);

        let mut avg = 0.0;
        for _i in 0..512 {
            avg = decay_avg(avg, 1.0, 64.0);
        }
        assert!(avg > 0.99);
    }

    #[test]
    fn test_discriminates_mark() {
        let mut atc = AtcDiscriminator::new(110.25);

        // alternating strong mark / weak space bits
        let mut last = 0;
        for i in 0..4096 {
            let mark = if (i / 110) % 2 == 0 { 1000.0 } else { 10.0 };
            let space = if (i / 110) % 2 == 0 { 10.0 } else { 1000.0 };
            last = atc.input(mark, space);
        }
        // the loop ends mid mark-bit or space-bit; either way the
        // decision must be confident
        assert!(last.abs() > 3);

        // steady mark after the envelopes have settled
        let mut atc = AtcDiscriminator::new(110.25);
        let mut soft = 0;
        for _i in 0..2048 {
            soft = atc.input(1000.0, 10.0);
        }
        assert!(soft > 0);

        let mut atc = AtcDiscriminator::new(110.25);
        let mut soft = 0;
        for _i in 0..2048 {
            soft = atc.input(10.0, 1000.0);
        }
        assert!(soft < 0);
    }

    #[test]
    fn test_nonfinite_input_dropped() {
        let mut atc = AtcDiscriminator::new(110.25);
        for _i in 0..256 {
            let _ = atc.input(1000.0, 10.0);
        }
        let env_before = atc.mark_env;

        assert_eq!(0, atc.input(f64::NAN, 10.0));
        assert_eq!(0, atc.input(1000.0, f64::INFINITY));
        assert_eq!(env_before, atc.mark_env);

        // and the state is still finite and usable
        assert!(atc.input(1000.0, 10.0) > 0);
    }
}

//! Complex mixer / numerically-controlled oscillator

use num_complex::Complex;

/// Complex mixer
///
/// Multiplies each input sample by `exp(-j·φ)`, where `φ` advances
/// by `2π·f/Fs` per sample. A mixer tuned to a tone shifts that tone
/// to DC, where a narrow low-pass can select it.
#[derive(Clone, Debug)]
pub struct Mixer {
    phase: f64,
    rate: f64,
}

impl Mixer {
    /// New mixer tuned to `freq` Hz at `sample_rate` Hz
    pub fn new(freq: f64, sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            rate: 2.0 * std::f64::consts::PI * freq / sample_rate,
        }
    }

    /// Mix one sample
    #[inline]
    pub fn mix(&mut self, input: Complex<f64>) -> Complex<f64> {
        let out = Complex::new(self.phase.cos(), self.phase.sin()) * input;

        self.phase -= self.rate;
        // wrap to [-2π, 2π] so the phase never loses precision
        if self.phase < -2.0 * std::f64::consts::PI {
            self.phase += 2.0 * std::f64::consts::PI;
        }

        out
    }

    /// Reset oscillator phase
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

//! Overlap-save FFT low-pass filter
//!
//! The mark and space tones sit only ±85 Hz from the carrier, so the
//! per-tone low-pass must be very narrow: a cutoff near 0.009 of the
//! sampling rate at 11025 Hz. A 512-tap FIR gets the shape right, and
//! running the convolution as overlap-save FFT blocks keeps the cost
//! per sample small.
//!
//! The filter consumes one sample at a time and produces a whole block
//! of output samples whenever enough input has accumulated. Callers
//! must not assume one-in-one-out.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Number of filter taps in the low-pass prototype
pub const NTAPS: usize = 512;

/// Overlap-save FFT convolution filter
///
/// One instance filters one complex stream. The kernel is a windowed
/// root-raised-cosine low-pass, the classic RTTY matched-filter shape.
#[derive(Clone)]
pub struct FftFilt {
    fft_fwd: Arc<dyn Fft<f64>>,
    fft_inv: Arc<dyn Fft<f64>>,

    // frequency-domain kernel, with the 1/nfft inverse-FFT scale
    // folded in
    kernel: Vec<Complex<f64>>,

    // overlap-save input window: [previous NTAPS | current block]
    window: Vec<Complex<f64>>,

    // scratch for the in-place transforms
    scratch: Vec<Complex<f64>>,

    // valid output samples of the most recent block
    output: Vec<Complex<f64>>,

    // samples accumulated in the current block
    fill: usize,
}

impl FftFilt {
    /// New low-pass filter with normalized `cutoff` (cycles/sample)
    ///
    /// For SITOR-B the cutoff is `baud / sample_rate`.
    pub fn new(cutoff: f64) -> Self {
        let nfft = 2 * NTAPS;
        let mut planner = FftPlanner::new();
        let fft_fwd = planner.plan_fft_forward(nfft);
        let fft_inv = planner.plan_fft_inverse(nfft);

        // transform the impulse response once; fold in the inverse
        // transform's 1/nfft normalization
        let mut kernel: Vec<Complex<f64>> = rtty_taps(cutoff, NTAPS)
            .into_iter()
            .map(|h| Complex::new(h, 0.0))
            .collect();
        kernel.resize(nfft, Complex::new(0.0, 0.0));
        fft_fwd.process(&mut kernel);
        let scale = 1.0 / nfft as f64;
        for k in kernel.iter_mut() {
            *k *= scale;
        }

        Self {
            fft_fwd,
            fft_inv,
            kernel,
            window: vec![Complex::new(0.0, 0.0); nfft],
            scratch: vec![Complex::new(0.0, 0.0); nfft],
            output: Vec::with_capacity(NTAPS),
            fill: 0,
        }
    }

    /// Push one sample; returns the filtered block when one is ready
    ///
    /// Most calls return an empty slice. Every `NTAPS` input samples,
    /// a full block of `NTAPS` filtered samples is returned.
    pub fn run(&mut self, input: Complex<f64>) -> &[Complex<f64>] {
        self.window[NTAPS + self.fill] = input;
        self.fill += 1;
        if self.fill < NTAPS {
            self.output.clear();
            return &self.output;
        }

        // block complete: circular convolution, discard the first
        // NTAPS outputs (they wrap), keep the rest
        self.scratch.copy_from_slice(&self.window);
        self.fft_fwd.process(&mut self.scratch);
        for (s, k) in self.scratch.iter_mut().zip(self.kernel.iter()) {
            *s *= *k;
        }
        self.fft_inv.process(&mut self.scratch);

        self.output.clear();
        self.output.extend_from_slice(&self.scratch[NTAPS..]);

        // save the overlap for the next block
        let (head, tail) = self.window.split_at_mut(NTAPS);
        head.copy_from_slice(tail);
        self.fill = 0;

        &self.output
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        for s in self.window.iter_mut() {
            *s = Complex::new(0.0, 0.0);
        }
        self.output.clear();
        self.fill = 0;
    }
}

impl std::fmt::Debug for FftFilt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftFilt")
            .field("ntaps", &NTAPS)
            .field("fill", &self.fill)
            .finish()
    }
}

// Windowed root-raised-cosine low-pass prototype
//
// The taps are the time-domain root-raised-cosine pulse with full
// rolloff (β = 1) and symbol period 1/cutoff samples, which puts the
// filter edge at the cutoff frequency. A Hamming window tames the
// truncation, and the taps are scaled for unit DC gain.
fn rtty_taps(cutoff: f64, ntaps: usize) -> Vec<f64> {
    const BETA: f64 = 1.0;

    let period = 1.0 / cutoff;
    let mid = (ntaps - 1) as f64 / 2.0;
    let mut taps = Vec::with_capacity(ntaps);

    for i in 0..ntaps {
        let t = (i as f64 - mid) / period;
        let h = rrc_pulse(t, BETA);
        let w = 0.54
            - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (ntaps - 1) as f64).cos();
        taps.push(h * w);
    }

    let sum: f64 = taps.iter().sum();
    for tap in taps.iter_mut() {
        *tap /= sum;
    }
    taps
}

// Root-raised-cosine pulse at normalized time t (symbol periods)
fn rrc_pulse(t: f64, beta: f64) -> f64 {
    use std::f64::consts::PI;

    if t.abs() < 1e-9 {
        return 1.0 + beta * (4.0 / PI - 1.0);
    }

    let fourbt = 4.0 * beta * t;
    if (fourbt.abs() - 1.0).abs() < 1e-9 {
        // removable singularity at |t| = 1/(4β)
        let x = PI / (4.0 * beta);
        return (beta / 2.0f64.sqrt())
            * ((1.0 + 2.0 / PI) * x.sin() + (1.0 - 2.0 / PI) * x.cos());
    }

    ((PI * t * (1.0 - beta)).sin() + fourbt * (PI * t * (1.0 + beta)).cos())
        / (PI * t * (1.0 - fourbt * fourbt))
}

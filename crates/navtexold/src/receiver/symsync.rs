//! Multicorrelator bit clock
//!
//! Tracks the 100-baud bit phase with three accumulators sampled
//! early, prompt, and late. The prompt event is where bits are
//! decided; early and late exist only to steer the prompt toward the
//! point of maximum accumulator deviation.
//!
//! If the incoming signal peaks early, the decoder is sampling late,
//! and vice versa. Every eight bit periods the difference between the
//! averaged early and late magnitudes nudges all three event times.
//! When the prompt finds itself in a signal *minimum* — the clock has
//! slipped half a bit — the loop jumps directly to whichever side is
//! stronger instead of waiting for the slow correction.
//!
//! Event times are fractional samples. At 11025 Hz a bit is 110.25
//! samples long; truncating that to an integer would make the clock
//! chase the signal forever, losing a bit every few seconds.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use super::demod::decay_avg;

// early and late events straddle the prompt by one fifth of a bit.
// A wider spread is more robust in noise but shrinks the deviation
// seen at the prompt.
const SPREAD_DIV: f64 = 5.0;

// decay time constant for the early/prompt/late magnitude averages
const AVG_BITS: f64 = 64.0;

/// Bit-phase tracker
///
/// Feed one soft bit per filtered sample with
/// [`input()`](BitClock::input). When the prompt event fires, the
/// accumulated soft bit value for the whole bit period is returned.
#[derive(Clone, Debug)]
pub struct BitClock {
    bit_samples: f64,
    reverse: bool,

    // filtered-sample counter; event times share these units
    sample_count: u64,
    adjust_interval: u64,

    early_acc: f64,
    prompt_acc: f64,
    late_acc: f64,

    next_early: f64,
    next_prompt: f64,
    next_late: f64,

    avg_early: f64,
    avg_prompt: f64,
    avg_late: f64,
}

impl BitClock {
    /// New bit clock for `bit_samples` samples per bit
    ///
    /// Set `reverse` to swap the mark/space sense of the decided bits.
    pub fn new(bit_samples: f64, reverse: bool) -> Self {
        Self {
            bit_samples,
            reverse,
            sample_count: 0,
            adjust_interval: (bit_samples * 8.0) as u64,
            early_acc: 0.0,
            prompt_acc: 0.0,
            late_acc: 0.0,
            next_early: 0.0,
            next_prompt: bit_samples / SPREAD_DIV,
            next_late: bit_samples * 2.0 / SPREAD_DIV,
            avg_early: 0.0,
            avg_prompt: 0.0,
            avg_late: 0.0,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        *self = Self::new(self.bit_samples, self.reverse);
    }

    /// Process one soft bit sample
    ///
    /// Returns the accumulated bit decision when the prompt event
    /// fires, about once per bit period.
    pub fn input(&mut self, soft: i32) -> Option<i32> {
        if self.sample_count % self.adjust_interval == 0 {
            self.adjust_phase();
        }

        self.early_acc += soft as f64;
        self.prompt_acc += soft as f64;
        self.late_acc += soft as f64;

        let now = self.sample_count as f64;

        if now >= self.next_early {
            self.avg_early = decay_avg(self.avg_early, self.early_acc.abs(), AVG_BITS);
            self.next_early += self.bit_samples;
            self.early_acc = 0.0;
        }

        if now >= self.next_late {
            self.avg_late = decay_avg(self.avg_late, self.late_acc.abs(), AVG_BITS);
            self.next_late += self.bit_samples;
            self.late_acc = 0.0;
        }

        let mut decision = None;
        if now >= self.next_prompt {
            self.avg_prompt = decay_avg(self.avg_prompt, self.prompt_acc.abs(), AVG_BITS);
            self.next_prompt += self.bit_samples;
            let mut bit = self.prompt_acc as i32;
            if self.reverse {
                bit = -bit;
            }
            self.prompt_acc = 0.0;
            decision = Some(bit);
        }

        self.sample_count += 1;
        decision
    }

    // Steer the sampling phase toward the signal
    //
    // Runs once every eight bit periods.
    fn adjust_phase(&mut self) {
        let mut slope = self.avg_late - self.avg_early;

        if self.avg_prompt * 1.05 < self.avg_early && self.avg_prompt * 1.05 < self.avg_late {
            // the prompt sits in a signal minimum: the clock slipped
            // half a bit. Jump to the stronger side at once.
            if self.avg_early > self.avg_late {
                slope = self.next_early - self.next_prompt;
                slope = (slope - self.bit_samples) % self.bit_samples;
                self.avg_late = self.avg_prompt;
                self.avg_prompt = self.avg_early;
            } else {
                slope = self.next_late - self.next_prompt;
                slope = (slope + self.bit_samples) % self.bit_samples;
                self.avg_early = self.avg_prompt;
                self.avg_prompt = self.avg_late;
            }
        } else {
            slope /= 1024.0;
        }

        if slope != 0.0 {
            self.next_early += slope;
            self.next_prompt += slope;
            self.next_late += slope;
            debug!(
                "bit clock: adjusting by {:1.2}, early {:1.1}, prompt {:1.1}, late {:1.1}",
                slope, self.avg_early, self.avg_prompt, self.avg_late
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // feed a square bit stream with the given samples per bit and
    // phase offset; returns the decided bits
    fn run_bits(clock: &mut BitClock, bit_samples: f64, nbits: usize, offset: usize) -> Vec<i32> {
        let mut out = Vec::new();
        let total = (nbits as f64 * bit_samples) as usize;
        for n in 0..total {
            let bit_index = ((n + offset) as f64 / bit_samples) as usize;
            // alternate two bits mark, two bits space, strongly decided
            let soft = if (bit_index / 2) % 2 == 0 { 12 } else { -12 };
            if let Some(decision) = clock.input(soft) {
                out.push(decision);
            }
        }
        out
    }

    #[test]
    fn test_decision_rate() {
        // one decision per bit period, fractional rates included
        const BIT_SAMPLES: f64 = 110.25;

        let mut clock = BitClock::new(BIT_SAMPLES, false);
        let decisions = run_bits(&mut clock, BIT_SAMPLES, 200, 0);
        assert!((decisions.len() as i64 - 200).abs() <= 2);
    }

    #[test]
    fn test_decisions_track_signal() {
        const BIT_SAMPLES: f64 = 110.25;

        let mut clock = BitClock::new(BIT_SAMPLES, false);
        // let the timing loop converge first; the proportional
        // correction moves the phase less than a sample per adjustment
        let _ = run_bits(&mut clock, BIT_SAMPLES, 512, 17);

        let decisions = run_bits(&mut clock, BIT_SAMPLES, 64, 17);
        // nearly all decisions should have full confidence: a decided
        // bit integrates ~110 samples of ±12
        let confident = decisions.iter().filter(|d| d.unsigned_abs() > 800).count();
        assert!(
            confident * 10 >= decisions.len() * 8,
            "{} of {} confident",
            confident,
            decisions.len()
        );
    }

    #[test]
    fn test_reverse_negates() {
        const BIT_SAMPLES: f64 = 110.25;

        let mut fwd = BitClock::new(BIT_SAMPLES, false);
        let mut rev = BitClock::new(BIT_SAMPLES, true);

        for n in 0..20_000 {
            let soft = if (n / 110) % 2 == 0 { 9 } else { -9 };
            let a = fwd.input(soft);
            let b = rev.input(soft);
            match (a, b) {
                (Some(x), Some(y)) => assert_eq!(x, -y),
                (None, None) => {}
                _ => unreachable!("clocks diverged"),
            }
        }
    }
}

//! Full receiver chain

mod assembler;
mod combiner;
mod demod;
mod fftfilt;
mod framing;
mod mixer;
mod symsync;

use std::io;
use std::io::Write;

use num_complex::Complex;

use crate::builder::NavtexReceiverBuilder;

use self::assembler::Assembler;
use self::demod::AtcDiscriminator;
use self::fftfilt::FftFilt;
use self::framing::Framer;
use self::mixer::Mixer;
use self::symsync::BitClock;

/// A complete NAVTEX / SITOR-B receiver chain
///
/// The receiver takes `f64` audio samples, nominally in `[-1.0, 1.0]`,
/// and performs the following operations:
///
/// 1. Complex mixing of the mark and space tones to baseband
/// 2. Narrow low-pass filtering of each tone, matched to the baud rate
/// 3. Mark/space discrimination with automatic threshold correction
/// 4. Bit clock recovery with an early/prompt/late multicorrelator
/// 5. Frame synchronization and CCIR 476 FEC decoding
/// 6. Message assembly: `ZCZC … NNNN` envelopes, written to the sink
///
/// Create the receiver through its
/// [builder](crate::NavtexReceiverBuilder):
///
/// ```
/// use navtexold::NavtexReceiverBuilder;
///
/// let mut rx = NavtexReceiverBuilder::new(11025)
///     .build(Vec::new())
///     .expect("valid config");
/// rx.process(&[0.0f64; 512]).expect("sink write");
/// assert_eq!(rx.input_rate(), 11025);
/// ```
///
/// The receiver is push-driven and single-threaded. Its notion of
/// time is the sample clock: feeding silence advances the inactivity
/// timeout just as wall-clock silence would. Completed messages are
/// written to the sink; sink errors propagate out of
/// [`process()`](NavtexReceiver::process).
#[derive(Clone, Debug)]
pub struct NavtexReceiver<W>
where
    W: Write,
{
    front: FrontEnd,
    demod: AtcDiscriminator,
    bitclock: BitClock,
    framer: Framer,
    assembler: Assembler<W>,
    input_rate: u32,
    input_sample_counter: u64,
}

impl<W> NavtexReceiver<W>
where
    W: Write,
{
    /// Create the receiver from its builder
    ///
    /// The builder validates the configuration before calling this.
    pub(crate) fn from_builder(cfg: &NavtexReceiverBuilder, sink: W) -> Self {
        let bit_samples = cfg.sample_rate() as f64 / cfg.baud();
        Self {
            front: FrontEnd::new(cfg),
            demod: AtcDiscriminator::new(bit_samples),
            bitclock: BitClock::new(bit_samples, cfg.reverse()),
            framer: Framer::new(cfg.baud() as usize, cfg.error_budget()),
            assembler: Assembler::new(sink, cfg.only_sitor_b(), cfg.timeout()),
            input_rate: cfg.sample_rate(),
            input_sample_counter: 0,
        }
    }

    /// Process a batch of audio samples
    ///
    /// Samples are mono PCM at [`input_rate()`](Self::input_rate),
    /// nominally in `[-1.0, 1.0]`. Decoded messages are written to
    /// the sink as they complete; the only error this method can
    /// return is a sink write error, and the demodulator state is
    /// unaffected by one.
    ///
    /// The inactivity timeout is evaluated once, at the start of
    /// each call.
    pub fn process(&mut self, samples: &[f64]) -> io::Result<()> {
        self.assembler.check_timeout(self.time_sec())?;

        for &sample in samples {
            let time_sec = self.input_sample_counter as f64 / self.input_rate as f64;
            self.input_sample_counter = self.input_sample_counter.wrapping_add(1);

            // promote to complex, scaled to i16 range like the
            // filters expect
            let (mark, space) = self.front.process(32767.0 * sample);

            for (zm, zs) in mark.iter().zip(space.iter()) {
                let soft = self.demod.input(zm.norm(), zs.norm());
                if let Some(bit) = self.bitclock.input(soft) {
                    for glyph in self.framer.input(bit) {
                        self.assembler.input(glyph, time_sec)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Input sampling rate (Hz)
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Lifetime total of input samples processed
    pub fn input_sample_counter(&self) -> u64 {
        self.input_sample_counter
    }

    /// Borrow the output sink
    pub fn sink(&self) -> &W {
        self.assembler.sink_ref()
    }

    /// Consume the receiver and return the sink
    pub fn into_sink(self) -> W {
        self.assembler.into_sink()
    }

    /// Clear all DSP state and return to signal acquisition
    ///
    /// The message assembler is left alone: a partially-received
    /// message survives a DSP reset.
    pub fn reset(&mut self) {
        self.front.reset();
        self.demod.reset();
        self.bitclock.reset();
        self.framer.reset();
    }

    // Sample time, in seconds since the first sample
    fn time_sec(&self) -> f64 {
        self.input_sample_counter as f64 / self.input_rate as f64
    }
}

// The analog front end: one mixer and one matched low-pass per tone
//
// Output blocks arrive at the same rate as the input, but in bursts:
// the FFT filters release a whole block at a time.
#[derive(Clone, Debug)]
struct FrontEnd {
    mark_mixer: Mixer,
    space_mixer: Mixer,
    mark_lowpass: FftFilt,
    space_lowpass: FftFilt,
}

impl FrontEnd {
    fn new(cfg: &NavtexReceiverBuilder) -> Self {
        let fs = cfg.sample_rate() as f64;
        let cutoff = cfg.baud() / fs;
        Self {
            mark_mixer: Mixer::new(cfg.center_freq() + cfg.deviation(), fs),
            space_mixer: Mixer::new(cfg.center_freq() - cfg.deviation(), fs),
            mark_lowpass: FftFilt::new(cutoff),
            space_lowpass: FftFilt::new(cutoff),
        }
    }

    // Mix and filter one input sample
    //
    // Returns filtered mark and space blocks; both are empty except
    // when a filter block completes.
    fn process(&mut self, sample: f64) -> (&[Complex<f64>], &[Complex<f64>]) {
        let z = Complex::new(sample, sample);
        let zm = self.mark_mixer.mix(z);
        let zs = self.space_mixer.mix(z);
        let mark = self.mark_lowpass.run(zm);
        let space = self.space_lowpass.run(zs);
        debug_assert_eq!(mark.len(), space.len());
        (mark, space)
    }

    fn reset(&mut self) {
        self.mark_mixer.reset();
        self.space_mixer.reset();
        self.mark_lowpass.reset();
        self.space_lowpass.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::waveform;

    // Synthesize a SITOR-B transmission of `text`
    fn synth(text: &str, fs: u32, reverse: bool, lead_pairs: usize) -> Vec<f64> {
        let codes = waveform::encode_text(text);
        let slots = waveform::interleave_with_lead(&codes, lead_pairs);
        let symbols = waveform::codes_to_symbols(&slots);
        waveform::modulate_fsk(&symbols, fs, reverse)
    }

    // A long phasing lead: a cold bit clock converges a fraction of
    // a sample per adjustment, so give it several seconds
    const LEAD_PAIRS: usize = 80;

    const TEST_MESSAGE: &str = "ZCZC FA01\r\nTEST\r\nNNNN";

    fn decode(audio: &[f64], fs: u32, reverse: bool) -> String {
        let mut rx = NavtexReceiverBuilder::new(fs)
            .with_reverse(reverse)
            .build(Vec::new())
            .expect("valid config");
        rx.process(audio).expect("sink write");
        // a second of silence drains the filter blocks
        rx.process(&vec![0.0f64; fs as usize]).expect("sink write");
        String::from_utf8(rx.into_sink()).expect("utf8 output")
    }

    #[test]
    fn test_decode_message_11025() {
        let audio = synth(TEST_MESSAGE, 11025, false, LEAD_PAIRS);
        let out = decode(&audio, 11025, false);

        assert!(
            out.ends_with("ZCZC FA01\nTEST\nNNNN\n"),
            "unexpected output: {:?}",
            out
        );
        assert_eq!(1, out.matches("ZCZC FA01").count());
    }

    #[test]
    fn test_decode_message_48000() {
        let audio = synth(TEST_MESSAGE, 48000, false, LEAD_PAIRS);
        let out = decode(&audio, 48000, false);

        assert!(
            out.ends_with("ZCZC FA01\nTEST\nNNNN\n"),
            "unexpected output: {:?}",
            out
        );
    }

    #[test]
    fn test_reverse_decodes_swapped_tones() {
        // a tone-swapped transmission with the reverse flag decodes
        // identically to the normal transmission without it
        let normal = decode(&synth(TEST_MESSAGE, 11025, false, LEAD_PAIRS), 11025, false);
        let swapped = decode(&synth(TEST_MESSAGE, 11025, true, LEAD_PAIRS), 11025, true);

        assert!(normal.contains("ZCZC FA01"));
        assert_eq!(normal, swapped);
    }

    #[test]
    fn test_two_messages_in_order() {
        const FS: u32 = 11025;

        let mut audio = synth("ZCZC AB01\r\nFIRST MSG\r\nNNNN", FS, false, LEAD_PAIRS);
        audio.extend(std::iter::repeat(0.0).take(2 * FS as usize));
        // the second transmission gets its own phasing lead
        audio.extend(synth("ZCZC CD02\r\nSECOND MSG\r\nNNNN", FS, false, LEAD_PAIRS));

        let out = decode(&audio, FS, false);

        let first = out.find("ZCZC AB01").expect("first message missing");
        let second = out.find("ZCZC CD02").expect("second message missing");
        assert!(first < second);
        assert!(out.contains("FIRST MSG"));
        assert!(out.contains("SECOND MSG"));
    }

    #[test]
    fn test_truncated_message_times_out() {
        const FS: u32 = 11025;

        let audio = synth("ZCZC AB12\r\nPARTIAL", FS, false, LEAD_PAIRS);
        let silence = vec![0.0f64; 4 * FS as usize];

        let mut rx = NavtexReceiverBuilder::new(FS)
            .with_timeout(5.0)
            .build(Vec::new())
            .expect("valid config");
        rx.process(&audio).expect("sink write");
        // the timeout is checked at the start of each batch; the
        // third silent batch begins past it
        rx.process(&silence).expect("sink write");
        rx.process(&silence).expect("sink write");
        rx.process(&silence).expect("sink write");

        let out = String::from_utf8(rx.into_sink()).expect("utf8 output");
        assert!(out.contains("ZCZC AB12"), "unexpected output: {:?}", out);
        assert!(out.contains("PARTIAL"), "unexpected output: {:?}", out);
        assert!(out.contains(":<TIMEOUT>"), "unexpected output: {:?}", out);
    }
}

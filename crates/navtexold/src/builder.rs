use std::io::Write;

use thiserror::Error;

use crate::receiver::NavtexReceiver;
use crate::waveform;

/// Minimum supported sampling rate (Hz)
///
/// Below this there is not enough bandwidth to separate the mark and
/// space tones around a 1 kHz carrier.
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Error constructing a [`NavtexReceiver`]
#[derive(Error, Clone, Debug, PartialEq)]
pub enum InvalidConfigErr {
    /// The sampling rate is too low for the waveform
    #[error("sample rate {0} Hz is too low; at least 8000 Hz is required")]
    SampleRate(u32),

    /// The baud rate must exceed 10 Hz
    #[error("baud rate {0} Hz is too low; it must exceed 10 Hz")]
    Baud(f64),
}

/// Builds a NAVTEX / SITOR-B receiver
///
/// The builder comes with the standard NAVTEX waveform parameters:
/// a 1000 Hz audio carrier with ±85 Hz shift at 100 baud. All you
/// really need to provide is the input sampling rate and the output
/// sink.
///
/// ```
/// use navtexold::NavtexReceiverBuilder;
///
/// let rx = NavtexReceiverBuilder::new(11025)
///     .with_reverse(false)
///     .build(Vec::new())
///     .expect("valid config");
/// assert_eq!(rx.input_rate(), 11025);
/// ```
///
/// The builder API is part of this crate's API. The default values
/// of the tunable constants are *not*, and may be revised in any
/// minor release.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct NavtexReceiverBuilder {
    sample_rate: u32,
    only_sitor_b: bool,
    reverse: bool,
    center_freq: f64,
    deviation: f64,
    baud: f64,
    timeout: f64,
    error_budget: i32,
}

impl NavtexReceiverBuilder {
    /// New receiver builder for the given input sampling rate (Hz)
    ///
    /// Any rate of [`MIN_SAMPLE_RATE`] or above works; the receiver
    /// adapts internally and never resamples. 11025 Hz and 48000 Hz
    /// are common choices.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            only_sitor_b: false,
            reverse: false,
            center_freq: waveform::CENTER_FREQ_HZ,
            deviation: waveform::DEVIATION_HZ,
            baud: waveform::BAUD_HZ,
            timeout: 600.0,
            error_budget: 5,
        }
    }

    /// Build a receiver writing decoded messages to `sink`
    ///
    /// Fails with [`InvalidConfigErr`] if the configuration cannot
    /// produce a working demodulator.
    pub fn build<W>(&self, sink: W) -> Result<NavtexReceiver<W>, InvalidConfigErr>
    where
        W: Write,
    {
        if self.sample_rate < MIN_SAMPLE_RATE {
            return Err(InvalidConfigErr::SampleRate(self.sample_rate));
        }
        if self.baud <= 10.0 {
            return Err(InvalidConfigErr::Baud(self.baud));
        }
        Ok(NavtexReceiver::from_builder(self, sink))
    }

    /// Decode bare SITOR-B instead of NAVTEX
    ///
    /// In SITOR-B mode there is no `ZCZC … NNNN` envelope: every
    /// decoded glyph streams straight to the sink and the inactivity
    /// timeout is disabled.
    pub fn with_only_sitor_b(&mut self, only_sitor_b: bool) -> &mut Self {
        self.only_sitor_b = only_sitor_b;
        self
    }

    /// Swap the mark and space sense
    ///
    /// Use when the radio is tuned to the wrong sideband, which
    /// mirrors the two tones around the carrier.
    pub fn with_reverse(&mut self, reverse: bool) -> &mut Self {
        self.reverse = reverse;
        self
    }

    /// Audio center frequency (Hz)
    ///
    /// The mark and space tones sit at `center ± deviation`.
    pub fn with_center_freq(&mut self, center_freq: f64) -> &mut Self {
        self.center_freq = center_freq;
        self
    }

    /// FSK deviation from the center frequency (Hz)
    pub fn with_deviation(&mut self, deviation: f64) -> &mut Self {
        self.deviation = deviation;
        self
    }

    /// Baud rate (Hz)
    ///
    /// NAVTEX is always 100 baud; other SITOR-B services may differ.
    pub fn with_baud(&mut self, baud: f64) -> &mut Self {
        self.baud = baud;
        self
    }

    /// Message inactivity timeout (seconds of sample time)
    ///
    /// A message left open this long with no envelope activity is
    /// flushed with a `<TIMEOUT>` marker. The reference value is
    /// 600 seconds.
    pub fn with_timeout(&mut self, timeout: f64) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Decoding error budget before resynchronization
    ///
    /// Hard FEC failures charge this budget and clean decodes pay it
    /// down; exceeding it sends the frame synchronizer back to
    /// acquisition. The reference value is 5.
    pub fn with_error_budget(&mut self, error_budget: i32) -> &mut Self {
        self.error_budget = error_budget;
        self
    }

    /// Input sampling rate (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// True if decoding bare SITOR-B without envelopes
    pub fn only_sitor_b(&self) -> bool {
        self.only_sitor_b
    }

    /// True if the mark/space sense is swapped
    pub fn reverse(&self) -> bool {
        self.reverse
    }

    /// Audio center frequency (Hz)
    pub fn center_freq(&self) -> f64 {
        self.center_freq
    }

    /// FSK deviation (Hz)
    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    /// Baud rate (Hz)
    pub fn baud(&self) -> f64 {
        self.baud
    }

    /// Message inactivity timeout (seconds)
    pub fn timeout(&self) -> f64 {
        self.timeout
    }

    /// Decoding error budget
    pub fn error_budget(&self) -> i32 {
        self.error_budget
    }
}

impl std::default::Default for NavtexReceiverBuilder {
    fn default() -> Self {
        Self::new(11025)
    }
}

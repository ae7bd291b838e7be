//! # navtexold: NAVTEX / SITOR-B Demodulation
//!
//! This crate provides a streaming demodulator and decoder for
//! [NAVTEX](https://en.wikipedia.org/wiki/Navtex), the international
//! maritime broadcast service for navigational and meteorological
//! warnings. NAVTEX is transmitted as
//! SITOR-B (CCIR 476-4): 100-baud FSK with ±85 Hz shift, a 7-bit
//! constant-ratio alphabet, and time-diversity forward error
//! correction. The decoder ingests mono PCM audio and emits
//! plain-text messages bracketed by `ZCZC … NNNN`.
//!
//! ## Example
//!
//! You will first need baseband audio from a receiver tuned to a
//! NAVTEX frequency — 518 kHz for the international English-language
//! service — in upper sideband, so that the FSK tones land near
//! 1000 Hz in the audio passband. Obtaining the audio is beyond the
//! scope of this crate; a sound card, an SDR, or a recording all
//! work. Mix stereo down to mono first.
//!
//! ```
//! use navtexold::NavtexReceiverBuilder;
//!
//! # let some_audio_source: Vec<f64> = vec![0.0f64; 4096];
//! #
//! // create a receiver with your audio sampling rate and an output
//! // sink; completed messages are written to the sink
//! let mut rx = NavtexReceiverBuilder::new(11025)
//!     .build(Vec::new())
//!     .expect("valid config");
//!
//! // feed mono samples, nominally in [-1.0, 1.0], in any batch size
//! rx.process(&some_audio_source).expect("sink write");
//!
//! let transcript = String::from_utf8(rx.into_sink()).unwrap();
//! # assert!(transcript.is_empty());
//! ```
//!
//! The receiver is push-driven and deterministic: its state evolves
//! only as a function of the sample sequence, and "time" (for the
//! message inactivity timeout) is the sample clock. Two receivers on
//! independent streams share no state and may run on separate
//! threads.
//!
//! ## Background
//!
//! A NAVTEX character is transmitted twice: the REP copy first and
//! the ALPHA copy five character positions (35 bits) later. The
//! decoder combines both copies — soft-decision style, down to
//! flipping the least-confident bit — to ride through fading and
//! impulse noise. See the [receiver](NavtexReceiver) documentation
//! for the full chain.
//!
//! Decoded messages carry their [`Envelope`]: originating station,
//! [subject indicator](SubjectIndicator), and serial number.

mod builder;
mod ccir476;
mod message;
mod navcodes;
mod receiver;
mod waveform;

pub use builder::{InvalidConfigErr, NavtexReceiverBuilder, MIN_SAMPLE_RATE};
pub use ccir476::{Ccir476, Shift};
pub use message::{Envelope, EnvelopeParseErr, NavtexMessage};
pub use navcodes::SubjectIndicator;
pub use receiver::NavtexReceiver;
pub use waveform::{samples_per_bit, BAUD_HZ, CENTER_FREQ_HZ, DEVIATION_HZ};

//! Frame synchronization and character decoding
//!
//! Collects decided soft bits into a one-second FIFO, finds the 7-bit
//! character boundary and the alpha/rep interleave phase, and decodes
//! characters through the FEC [combiner](super::combiner).
//!
//! The synchronizer is a three-state machine:
//!
//! * `SyncSetup` — clear the error count and shift state
//! * `Sync` — search the buffer for the character boundary
//! * `ReadData` — decode characters, charging failures against an
//!   error budget; exceeding the budget forces a resync

use arrayvec::ArrayVec;

#[cfg(not(test))]
use log::{debug, info};

#[cfg(test)]
use std::{println as debug, println as info};

use super::combiner::{self, Combined, REP_OFFSET};
use crate::ccir476::{
    Ccir476, Shift, CODE_ALPHA, CODE_BETA, CODE_CHAR32, CODE_FIGS, CODE_LTRS, CODE_REP,
};

// With interleaved rep and alpha characters, the first alpha whose
// rep is also in the buffer can start at any of 14 bit offsets.
const SYNC_SEARCH_START: usize = REP_OFFSET;
const SYNC_SEARCH_END: usize = REP_OFFSET + 14;

/// Glyphs decoded from one input bit
///
/// Catching up after sync can decode several characters at once; in
/// the steady state at most one character decodes per seven bits.
pub type GlyphBatch = ArrayVec<u8, 16>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    SyncSetup,
    Sync,
    ReadData,
}

/// Frame synchronizer and character decoder
#[derive(Clone, Debug)]
pub struct Framer {
    // soft bit FIFO, one second of bits; index 0 is the oldest
    bits: Vec<i32>,

    // next character position; counts down as bits shift in
    cursor: usize,

    state: State,
    error_count: i32,
    error_budget: i32,

    // true when the character at the cursor is an alpha (information)
    // position rather than a rep
    alpha_phase: bool,

    shift: Shift,
    last_code: u8,
    ccir: Ccir476,
}

impl Framer {
    /// New framer holding `buffer_bits` soft bits
    ///
    /// `buffer_bits` should equal the baud rate, i.e. one second of
    /// bits. Decoding failures are charged against `error_budget`;
    /// when the budget is exceeded the framer drops back to sync
    /// acquisition.
    pub fn new(buffer_bits: usize, error_budget: i32) -> Self {
        Self {
            bits: vec![0; buffer_bits],
            cursor: 0,
            state: State::SyncSetup,
            error_count: 0,
            error_budget,
            alpha_phase: false,
            shift: Shift::Letters,
            last_code: 0,
            ccir: Ccir476::new(),
        }
    }

    /// Reset to sync acquisition, clearing the bit buffer
    pub fn reset(&mut self) {
        for b in self.bits.iter_mut() {
            *b = 0;
        }
        self.cursor = 0;
        self.state = State::SyncSetup;
        self.error_count = 0;
        self.alpha_phase = false;
        self.shift = Shift::Letters;
        self.last_code = 0;
    }

    /// Handle one decided soft bit
    ///
    /// Shifts the bit into the FIFO and runs the synchronizer.
    /// Returns any glyphs decoded as a result. Control codes are
    /// consumed internally; only printable glyphs (plus CR, LF, and
    /// BELL) are returned.
    pub fn input(&mut self, soft: i32) -> GlyphBatch {
        let mut out = GlyphBatch::new();

        // shift the FIFO left one bit
        self.bits.rotate_left(1);
        *self.bits.last_mut().expect("empty bit buffer") = soft;
        self.cursor = self.cursor.saturating_sub(1);

        if self.state == State::SyncSetup {
            self.error_count = 0;
            self.shift = Shift::Letters;
            self.state = State::Sync;
        }

        if self.state == State::Sync {
            match self.find_alpha_phase() {
                Some(offset) => {
                    debug!("framer: sync at bit offset {}", offset);
                    self.cursor = offset;
                    self.alpha_phase = true;
                    self.state = State::ReadData;
                }
                None => {
                    self.state = State::SyncSetup;
                    return out;
                }
            }
        }

        // decode every complete character position available
        while self.cursor + 7 <= self.bits.len() {
            if self.alpha_phase {
                let Combined { code, success } = combiner::combine(&mut self.bits, self.cursor);
                self.error_count -= success;
                if let Some(code) = code {
                    if let Some(glyph) = self.decode(code) {
                        out.push(glyph);
                    }
                }
                if self.error_count > self.error_budget {
                    info!("framer: error budget exhausted; resyncing");
                    self.state = State::SyncSetup;
                    break;
                }
                if self.error_count < 0 {
                    self.error_count = 0;
                }
            }
            self.alpha_phase = !self.alpha_phase;
            self.cursor += 7;
        }

        out
    }

    // Decode an accepted code word under the current shift
    //
    // Returns the glyph for printable characters. Shift and phasing
    // codes update decoder state and return nothing.
    fn decode(&mut self, code: u8) -> Option<u8> {
        let out = match code {
            CODE_REP => {
                // two reps in a row means the alpha/rep phase flipped
                if self.last_code == CODE_REP {
                    debug!("framer: fixing rep/alpha sync");
                    self.alpha_phase = false;
                }
                None
            }
            CODE_ALPHA | CODE_BETA | CODE_CHAR32 => None,
            CODE_LTRS => {
                self.shift = Shift::Letters;
                None
            }
            CODE_FIGS => {
                self.shift = Shift::Figures;
                None
            }
            _ => match self.ccir.code_to_char(code, self.shift) {
                Some(glyph) => Some(glyph),
                None => {
                    info!("framer: missed code {:#04x}", code);
                    None
                }
            },
        };
        self.last_code = code;
        out
    }

    // Search for the bit offset where alpha characters begin
    //
    // Walks each candidate offset in character steps, counting valid
    // code words and rep/alpha agreements 35 bits apart. Control-code
    // self-matches indicate the wrong interleave phase and void the
    // candidate's score. A winner needs at least three rep matches
    // and a combined score above eight.
    fn find_alpha_phase(&self) -> Option<usize> {
        let mut best_offset = 0;
        let mut best_score = 0;
        let limit = self.bits.len() - 7;

        for offset in SYNC_SEARCH_START..SYNC_SEARCH_END {
            let mut score = 0u32;
            let mut reps = 0u32;

            let mut i = offset;
            while i < limit {
                if Ccir476::valid_char_at(&self.bits[i..i + 7]) {
                    let code = Ccir476::bytes_to_code(&self.bits[i..i + 7]);
                    let rep =
                        Ccir476::bytes_to_code(&self.bits[i - REP_OFFSET..i - REP_OFFSET + 7]);

                    score += 1;

                    if code == rep {
                        if code == CODE_ALPHA || code == CODE_REP {
                            // phasing codes matching themselves 35
                            // bits apart means rep and alpha are
                            // spaced odd; this offset is wrong
                            score = 0;
                            i += 7;
                            continue;
                        }
                        reps += 1;
                    } else if code == CODE_ALPHA {
                        // idle alpha: is the preceding slot its rep?
                        let prev = Ccir476::bytes_to_code(&self.bits[i - 7..i]);
                        if prev == CODE_REP {
                            reps += 1;
                        }
                    }
                }
                i += 7;
            }

            if reps >= 3 && score + reps > best_score {
                best_score = score + reps;
                best_offset = offset;
            }
        }

        // the buffer holds 14 characters; demand that most are good
        if best_score > 8 {
            Some(best_offset)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::waveform;

    // Feed a code stream into the framer as strong soft bits,
    // returning every decoded glyph
    fn run_codes(framer: &mut Framer, codes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &code in codes {
            for bit in 0..7 {
                let soft = if (code >> bit) & 1 == 1 { 10 } else { -10 };
                out.extend(framer.input(soft));
            }
        }
        out
    }

    #[test]
    fn test_sync_and_decode() {
        let slots = waveform::interleave(&waveform::encode_text("NAUTICAL"));

        let mut framer = Framer::new(100, 5);
        let glyphs = run_codes(&mut framer, &slots);

        assert_eq!(b"NAUTICAL".as_slice(), glyphs.as_slice());
    }

    #[test]
    fn test_figures_shift() {
        let slots = waveform::interleave(&waveform::encode_text("QTH 4512"));

        let mut framer = Framer::new(100, 5);
        let glyphs = run_codes(&mut framer, &slots);

        assert_eq!(b"QTH 4512".as_slice(), glyphs.as_slice());
    }

    #[test]
    fn test_decodes_through_bit_error() {
        // corrupt one bit of one alpha copy; the rep recovers it
        let slots = waveform::interleave(&waveform::encode_text("NAUTICAL"));

        let mut framer = Framer::new(100, 5);
        let mut glyphs = Vec::new();
        let mut bit_index = 0usize;

        // flip a bit deep in the message, well after sync
        let target = 7 * (slots.len() - 8) + 3;
        for &code in &slots {
            for bit in 0..7 {
                let mut soft = if (code >> bit) & 1 == 1 { 10 } else { -10 };
                if bit_index == target {
                    soft = -soft;
                }
                bit_index += 1;
                glyphs.extend(framer.input(soft));
            }
        }

        assert_eq!(b"NAUTICAL".as_slice(), glyphs.as_slice());
    }

    #[test]
    fn test_no_sync_on_noise() {
        // alternating junk with no constant-ratio structure must not
        // produce output
        let mut framer = Framer::new(100, 5);
        let mut glyphs = Vec::new();
        for i in 0..2000 {
            let soft = if i % 2 == 0 { 7 } else { -7 };
            glyphs.extend(framer.input(soft));
        }
        assert!(glyphs.is_empty());
    }
}

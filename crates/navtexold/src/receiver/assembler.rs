//! NAVTEX message assembly
//!
//! Collects decoded glyphs into messages bracketed by `ZCZC B1B2nn`
//! and `NNNN`, and writes each completed message to the output sink.
//! Real broadcasts lose headers and trailers all the time, so the
//! assembler never discards text: a flush with a missing boundary is
//! annotated `[Lost header]` or `[Lost trailer]` instead.
//!
//! A message left open with no traffic is flushed with a `<TIMEOUT>`
//! marker once the inactivity timeout expires. Time here is sample
//! time, not wall-clock: the receiver derives it from its sample
//! counter.

use std::io;
use std::io::Write;

use lazy_static::lazy_static;
use regex::Regex;

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

use crate::ccir476::{CHAR_BELL, CODE_ALPHA, CODE_REP};
use crate::message::{Envelope, NavtexMessage};

// "ZCZC B1B2nn" plus the line terminator
const HEADER_LEN: usize = 10;

// message end marker
const TRAILER: &str = "NNNN";

/// Message assembler
///
/// Owns the output sink. All writes happen from inside
/// [`input()`](Assembler::input) and
/// [`check_timeout()`](Assembler::check_timeout); write errors
/// propagate to the caller.
#[derive(Clone, Debug)]
pub struct Assembler<W>
where
    W: Write,
{
    sink: W,
    only_sitor_b: bool,
    timeout_secs: f64,

    text: String,
    envelope: Option<Envelope>,

    // sample time of the last message activity
    message_time: f64,
}

impl<W> Assembler<W>
where
    W: Write,
{
    /// New assembler writing flushed messages to `sink`
    ///
    /// With `only_sitor_b`, envelope detection and timeouts are
    /// disabled and every glyph streams straight to the sink.
    pub fn new(sink: W, only_sitor_b: bool, timeout_secs: f64) -> Self {
        Self {
            sink,
            only_sitor_b,
            timeout_secs,
            text: String::new(),
            envelope: None,
            message_time: 0.0,
        }
    }

    /// Borrow the output sink
    pub fn sink_ref(&self) -> &W {
        &self.sink
    }

    /// Consume the assembler and return the sink
    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Handle one decoded glyph at sample time `time_sec`
    pub fn input(&mut self, glyph: u8, time_sec: f64) -> io::Result<()> {
        // BELL prints as an apostrophe, the French NAVTEX convention
        let glyph = if glyph == CHAR_BELL { b'\'' } else { glyph };
        if glyph == b'\r' || glyph == CODE_ALPHA || glyph == CODE_REP {
            return Ok(());
        }

        if self.only_sitor_b {
            self.message_time = time_sec;
            return self.sink.write_all(&[glyph]);
        }

        self.text.push(glyph as char);

        if let Some(env) = self.detect_header() {
            self.text.truncate(self.text.len() - HEADER_LEN);
            if self.envelope.is_some() {
                // the previous message never saw its NNNN
                self.flush(":[Lost trailer]", time_sec)?;
            } else if !self.text.is_empty() {
                self.flush(":[Lost trailer]", time_sec)?;
            }
            self.envelope = Some(env);
            self.text.clear();
            self.message_time = time_sec;
            return Ok(());
        }

        if self.text.ends_with(TRAILER) {
            self.text.truncate(self.text.len() - TRAILER.len());
            self.flush("", time_sec)?;
        }

        Ok(())
    }

    /// Flush a lingering message if the inactivity timeout expired
    ///
    /// The receiver calls this at the start of every `process()`
    /// batch with the current sample time.
    pub fn check_timeout(&mut self, time_sec: f64) -> io::Result<()> {
        if self.only_sitor_b {
            return Ok(());
        }
        if time_sec - self.message_time <= self.timeout_secs {
            return Ok(());
        }
        info!(
            "assembler: timeout at {:0.1} s (last activity {:0.1} s)",
            time_sec, self.message_time
        );
        self.flush(":<TIMEOUT>", time_sec)
    }

    // Flush the accumulated text with `extra` appended
    //
    // A message with no envelope gains a `[Lost header]` annotation.
    // Every flush is emitted, even an empty one.
    fn flush(&mut self, extra: &str, time_sec: f64) -> io::Result<()> {
        let msg = match self.envelope.take() {
            Some(env) => {
                NavtexMessage::new(Some(env), cleanup(&format!("{}{}", self.text, extra)))
            }
            None => NavtexMessage::new(
                None,
                cleanup(&format!("[Lost header]:{}{}", self.text, extra)),
            ),
        };
        info!("assembler: message \"{}\"", msg);

        self.text.clear();
        self.message_time = time_sec;
        writeln!(self.sink, "{}", msg)
    }

    // Match "ZCZC B1B2nn" at the end of the accumulated text
    //
    // CR glyphs are dropped before accumulation, so the terminator
    // in practice is a line feed.
    fn detect_header(&self) -> Option<Envelope> {
        lazy_static! {
            static ref HEADER_RE: Regex =
                Regex::new(r"^ZCZC ([0-9A-Za-z])([0-9A-Za-z])([0-9])([0-9])[\r\n]$")
                    .expect("bad NAVTEX header regexp");
        }

        if self.text.len() < HEADER_LEN {
            return None;
        }
        let tail = &self.text[self.text.len() - HEADER_LEN..];
        let caps = HEADER_RE.captures(tail)?;
        let ch = |i: usize| caps.get(i).expect("missing capture").as_str().as_bytes()[0];
        Some(Envelope::new(
            ch(1) as char,
            ch(2) as char,
            (ch(3) - b'0') * 10 + (ch(4) - b'0'),
        ))
    }
}

// Tidy message text for presentation
//
// Collapses runs of CR/LF into a single line feed, runs of blanks
// into a single space, and strips non-printable characters. Leading
// and trailing whitespace disappears as a side effect.
fn cleanup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut was_delim = false;
    let mut was_space = false;
    let mut seen = false;

    for c in text.chars() {
        match c {
            '\r' | '\n' => was_delim = true,
            ' ' | '\t' => was_space = true,
            ' '..='~' => {
                if seen {
                    if was_delim {
                        out.push('\n');
                    } else if was_space {
                        out.push(' ');
                    }
                }
                was_delim = false;
                was_space = false;
                seen = true;
                out.push(c);
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(asm: &mut Assembler<Vec<u8>>, text: &str, time: f64) {
        for b in text.bytes() {
            asm.input(b, time).expect("sink write");
        }
    }

    #[test]
    fn test_cleanup() {
        assert_eq!("A B", cleanup("A  \t B"));
        assert_eq!("A\nB", cleanup("A\r\n\r\nB"));
        assert_eq!("AB", cleanup("\r\nA\x01B\n"));
        assert_eq!("", cleanup("  \r\n "));
    }

    #[test]
    fn test_single_message() {
        let mut asm = Assembler::new(Vec::new(), false, 600.0);
        feed(&mut asm, "ZCZC AB12\r\nHELLO WORLD\r\nNNNN", 1.0);

        let out = String::from_utf8(asm.sink).expect("utf8");
        assert_eq!("ZCZC AB12\nHELLO WORLD\nNNNN\n", out);
    }

    #[test]
    fn test_envelope_fields() {
        let mut asm = Assembler::new(Vec::new(), false, 600.0);
        feed(&mut asm, "ZCZC FA01\n", 1.0);

        let env = asm.envelope.expect("header detected");
        assert_eq!('F', env.origin());
        assert_eq!('A', env.subject());
        assert_eq!(1, env.number());
    }

    #[test]
    fn test_lost_trailer() {
        // a second header with the first message still open
        let mut asm = Assembler::new(Vec::new(), false, 600.0);
        feed(&mut asm, "ZCZC AB12\nFIRST\nZCZC CD34\nSECOND\nNNNN", 1.0);

        let out = String::from_utf8(asm.sink).expect("utf8");
        // the first body ends with a line feed, so the annotation
        // lands on its own line
        assert_eq!(
            "ZCZC AB12\nFIRST\n:[Lost trailer]\nNNNN\nZCZC CD34\nSECOND\nNNNN\n",
            out
        );
    }

    #[test]
    fn test_lost_header() {
        // text before any header flushes with both annotations
        let mut asm = Assembler::new(Vec::new(), false, 600.0);
        feed(&mut asm, "GARBAGE\nZCZC AB12\nBODY\nNNNN", 1.0);

        let out = String::from_utf8(asm.sink).expect("utf8");
        assert_eq!(
            "[Lost header]:GARBAGE\n:[Lost trailer]\nZCZC AB12\nBODY\nNNNN\n",
            out
        );
    }

    #[test]
    fn test_timeout_monotonic() {
        // exactly one timeout flush at the boundary, and the clock
        // rearms afterwards
        let mut asm = Assembler::new(Vec::new(), false, 600.0);

        asm.check_timeout(599.0).expect("sink write");
        assert!(asm.sink.is_empty());

        asm.check_timeout(601.0).expect("sink write");
        let first = String::from_utf8(asm.sink.clone()).expect("utf8");
        assert_eq!("[Lost header]::<TIMEOUT>\n", first);

        asm.check_timeout(650.0).expect("sink write");
        assert_eq!(first.len(), asm.sink.len());

        asm.check_timeout(1202.0).expect("sink write");
        assert!(asm.sink.len() > first.len());
    }

    #[test]
    fn test_timeout_flushes_partial_message() {
        let mut asm = Assembler::new(Vec::new(), false, 600.0);
        feed(&mut asm, "ZCZC AB12\nPARTIAL TEXT", 10.0);

        asm.check_timeout(611.0).expect("sink write");
        let out = String::from_utf8(asm.sink).expect("utf8");
        assert_eq!("ZCZC AB12\nPARTIAL TEXT:<TIMEOUT>\nNNNN\n", out);
    }

    #[test]
    fn test_sitor_b_streams() {
        let mut asm = Assembler::new(Vec::new(), true, 600.0);
        feed(&mut asm, "ZCZC AB12\r\nTEXT\r\nNNNN", 1.0);
        asm.check_timeout(5000.0).expect("sink write");

        // no envelope logic, no timeout: the glyph stream passes
        // through with CR dropped
        let out = String::from_utf8(asm.sink).expect("utf8");
        assert_eq!("ZCZC AB12\nTEXT\nNNNN", out);
    }

    #[test]
    fn test_bell_prints_apostrophe() {
        let mut asm = Assembler::new(Vec::new(), true, 600.0);
        asm.input(CHAR_BELL, 0.0).expect("sink write");
        assert_eq!(b"'", asm.sink.as_slice());
    }
}

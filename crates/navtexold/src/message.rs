//! Decoded NAVTEX messages

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::navcodes::SubjectIndicator;

/// Error parsing a NAVTEX envelope
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnvelopeParseErr {
    /// Input does not match the `B1B2nn` envelope format
    #[error("invalid NAVTEX envelope: expected two alphanumerics and two digits")]
    Malformed,
}

/// NAVTEX message envelope: `B1 B2 nn`
///
/// The envelope is the four-character identity transmitted after
/// `ZCZC`: the originating station (`B1`), the subject indicator
/// (`B2`), and a two-digit serial number.
///
/// ```
/// use navtexold::{Envelope, SubjectIndicator};
///
/// let env: Envelope = "FA01".parse().expect("parse");
/// assert_eq!('F', env.origin());
/// assert_eq!('A', env.subject());
/// assert_eq!(SubjectIndicator::NavigationalWarning, env.subject_indicator());
/// assert_eq!(1, env.number());
/// assert_eq!("ZCZC FA01", &format!("{}", env));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Envelope {
    origin: char,
    subject: char,
    number: u8,
}

impl Envelope {
    /// New envelope from its decoded fields
    pub fn new(origin: char, subject: char, number: u8) -> Self {
        Self {
            origin,
            subject,
            number,
        }
    }

    /// Originating station identity (`B1`)
    ///
    /// Station assignments are per-NAVAREA; the letter alone does
    /// not identify a station without a regional table.
    pub fn origin(&self) -> char {
        self.origin
    }

    /// Subject indicator character (`B2`)
    pub fn subject(&self) -> char {
        self.subject
    }

    /// Subject indicator, decoded
    pub fn subject_indicator(&self) -> SubjectIndicator {
        SubjectIndicator::from(self.subject)
    }

    /// Two-digit message serial number
    ///
    /// Serial `00` is reserved for urgent messages, which receivers
    /// must always print.
    pub fn number(&self) -> u8 {
        self.number
    }
}

impl FromStr for Envelope {
    type Err = EnvelopeParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref ENVELOPE_RE: Regex =
                Regex::new(r"^(?:ZCZC )?([0-9A-Za-z])([0-9A-Za-z])([0-9])([0-9])$")
                    .expect("bad envelope regexp");
        }

        let caps = ENVELOPE_RE.captures(s).ok_or(EnvelopeParseErr::Malformed)?;
        let ch = |i: usize| {
            caps.get(i)
                .expect("missing capture")
                .as_str()
                .chars()
                .next()
                .expect("empty capture")
        };
        let digit = |i: usize| ch(i).to_digit(10).expect("non-digit capture") as u8;
        Ok(Envelope {
            origin: ch(1).to_ascii_uppercase(),
            subject: ch(2).to_ascii_uppercase(),
            number: digit(3) * 10 + digit(4),
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZCZC {}{}{:02}", self.origin, self.subject, self.number)
    }
}

/// A flushed NAVTEX message
///
/// A message pairs an optional [`Envelope`] with the accumulated
/// message text. The envelope is absent when the `ZCZC` header was
/// never received; such flushes carry a `[Lost header]` annotation
/// in their text instead.
///
/// `Display` produces the sink wire format: headered messages are
/// bracketed by their `ZCZC B1B2nn` line and a closing `NNNN`;
/// headerless flushes are the bare text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NavtexMessage {
    envelope: Option<Envelope>,
    text: String,
}

impl NavtexMessage {
    /// New message from envelope and cleaned text
    pub fn new(envelope: Option<Envelope>, text: String) -> Self {
        Self { envelope, text }
    }

    /// Message envelope, if the header was received
    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Message text
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NavtexMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.envelope {
            Some(env) => write!(f, "{}\n{}\nNNNN", env, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

impl AsRef<str> for NavtexMessage {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

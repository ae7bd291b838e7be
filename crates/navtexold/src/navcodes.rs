//! NAVTEX subject indicator codes
//!
//! The second character of a NAVTEX header, `ZCZC B1B2nn`, is the
//! *subject indicator*: a single letter describing the kind of
//! broadcast. The first character (`B1`) identifies the transmitting
//! station and is assigned per NAVAREA, so it cannot be decoded
//! without a regional station table.

use std::fmt;
use std::str::FromStr;

use strum::EnumMessage;

/// NAVTEX message subject indicator
///
/// Subject indicators may be converted `from()` their single-letter
/// code. Using them via `Display` shows a human-readable description.
///
/// ```
/// use navtexold::SubjectIndicator;
///
/// let subj = SubjectIndicator::from('B');
/// assert_eq!(SubjectIndicator::MeteorologicalWarning, subj);
/// assert_eq!("B", subj.as_ref());
/// assert_eq!("Meteorological warning", &format!("{}", subj));
///
/// assert_eq!(SubjectIndicator::Unknown, SubjectIndicator::from('*'));
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage, strum_macros::EnumString,
)]
pub enum SubjectIndicator {
    /// An unrecognized subject indicator
    ///
    /// Receivers must accept any subject character; stations may use
    /// letters without an internationally-agreed meaning.
    #[strum(serialize = "?", detailed_message = "Unknown subject")]
    Unknown,

    /// Navigational warning
    ///
    /// Cannot be rejected by a receiver.
    #[strum(serialize = "A", detailed_message = "Navigational warning")]
    NavigationalWarning,

    /// Meteorological warning
    #[strum(serialize = "B", detailed_message = "Meteorological warning")]
    MeteorologicalWarning,

    /// Ice report
    #[strum(serialize = "C", detailed_message = "Ice report")]
    IceReport,

    /// Search and rescue information / piracy warning
    ///
    /// Cannot be rejected by a receiver.
    #[strum(serialize = "D", detailed_message = "Search and rescue information")]
    SearchAndRescue,

    /// Meteorological forecast
    #[strum(serialize = "E", detailed_message = "Meteorological forecast")]
    MeteorologicalForecast,

    /// Pilot service message
    #[strum(serialize = "F", detailed_message = "Pilot service message")]
    PilotService,

    /// AIS service message
    #[strum(serialize = "G", detailed_message = "AIS service message")]
    AisService,

    /// LORAN message
    #[strum(serialize = "H", detailed_message = "LORAN message")]
    Loran,

    /// Satellite navigation system message
    #[strum(serialize = "J", detailed_message = "Satellite navigation message")]
    SatelliteNavigation,

    /// Other electronic navigational aid message
    #[strum(serialize = "K", detailed_message = "Other electronic navaid message")]
    OtherNavaid,

    /// Additional navigational warnings (overflow from subject A)
    #[strum(serialize = "L", detailed_message = "Additional navigational warning")]
    NavigationalWarningExtra,

    /// Special service, trial allocation
    #[strum(serialize = "V", detailed_message = "Special service (V)")]
    SpecialServiceV,

    /// Special service, trial allocation
    #[strum(serialize = "W", detailed_message = "Special service (W)")]
    SpecialServiceW,

    /// Special service, trial allocation
    #[strum(serialize = "X", detailed_message = "Special service (X)")]
    SpecialServiceX,

    /// Special service, trial allocation
    #[strum(serialize = "Y", detailed_message = "Special service (Y)")]
    SpecialServiceY,

    /// No message on hand
    #[strum(serialize = "Z", detailed_message = "No message on hand")]
    NoMessage,
}

impl SubjectIndicator {
    /// Human-readable description, like "`Meteorological warning`"
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// Single-letter NAVTEX code for this subject
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }
}

impl From<char> for SubjectIndicator {
    fn from(c: char) -> SubjectIndicator {
        let mut buf = [0u8; 4];
        let s: &str = c.to_ascii_uppercase().encode_utf8(&mut buf);
        match SubjectIndicator::from_str(s) {
            Ok(subj) => subj,
            Err(_e) => SubjectIndicator::Unknown,
        }
    }
}

impl AsRef<str> for SubjectIndicator {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for SubjectIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_from_char() {
        assert_eq!(
            SubjectIndicator::NavigationalWarning,
            SubjectIndicator::from('A')
        );
        assert_eq!(
            SubjectIndicator::NavigationalWarning,
            SubjectIndicator::from('a')
        );
        assert_eq!(SubjectIndicator::NoMessage, SubjectIndicator::from('Z'));
        assert_eq!(SubjectIndicator::Unknown, SubjectIndicator::from('I'));
        assert_eq!(SubjectIndicator::Unknown, SubjectIndicator::from('0'));
    }

    #[test]
    fn test_subject_strings() {
        assert_eq!("B", SubjectIndicator::MeteorologicalWarning.as_ref());
        assert_eq!(
            "Ice report",
            &format!("{}", SubjectIndicator::IceReport)
        );
    }
}

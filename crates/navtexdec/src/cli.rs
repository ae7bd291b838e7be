use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts raw PCM samples in signed 16-bit little-endian (i16) format, at the given sampling RATE, and decodes any NAVTEX messages that are present. Decoded messages are printed as plain text, bracketed by their ZCZC header line and NNNN trailer.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts raw PCM samples in signed 16-bit little-endian (i16) format, at the given sampling RATE, and decodes any NAVTEX messages that are present. Decoded messages are printed as plain text, bracketed by their ZCZC header line and NNNN trailer.

Tune your receiver to a NAVTEX frequency (518 kHz for the international English-language service) in upper sideband, so the FSK tones land near 1000 Hz in the audio passband.

You can pipe in an audio file with sox:

    sox input.wav -t raw -r 11025 -e signed -b 16 -c 1 - \
        | navtexdec 11025

or decode a raw capture directly:

    navtexdec 11025 capture.raw

With --sitor-b, the envelope logic is disabled and every decoded character streams to standard output as it arrives. Use this for non-NAVTEX SITOR-B broadcasts.
"#;

const ADVANCED: &str = "Advanced Modem Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Sampling rate (Hz)
    ///
    /// Set to the sampling rate of your audio source. Avoid
    /// resampling the audio; the decoder adapts to any rate of
    /// 8000 Hz or above.
    #[arg(default_value_t = 11025)]
    pub rate: u32,

    /// Input file (or "-" for stdin)
    ///
    /// The input must be one-channel (mono), signed 16-bit
    /// little-endian at RATE.
    #[arg(default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING except decoded messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Decode bare SITOR-B without NAVTEX envelopes
    #[arg(long = "sitor-b")]
    pub sitor_b: bool,

    /// Swap the mark and space tones
    ///
    /// Use when the receiver is tuned to the wrong sideband.
    #[arg(long)]
    pub reverse: bool,

    /// Audio center frequency (Hz)
    #[arg(long, default_value_t = 1000.0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub center_freq: f64,

    /// Message inactivity timeout (s)
    #[arg(long, default_value_t = 600.0)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub timeout: f64,

    /// Decoding errors tolerated before resync
    #[arg(long, default_value_t = 5)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub error_budget: i32,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_positional_args() {
        let args = Args::try_parse_from(["navtexdec"]).expect("parse");
        assert_eq!(11025, args.rate);
        assert!(args.input_is_stdin());

        let args = Args::try_parse_from(["navtexdec", "48000", "cap.raw"]).expect("parse");
        assert_eq!(48000, args.rate);
        assert_eq!("cap.raw", args.file);
        assert!(!args.input_is_stdin());
    }
}

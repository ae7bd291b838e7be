use std::io;
use std::io::IsTerminal;

use anyhow::{anyhow, Context};
use byteorder::LittleEndian;
use clap::Parser;
use log::{info, LevelFilter};

use navtexold::NavtexReceiverBuilder;

mod cli;

use cli::{Args, CliError};

// read the input in 8 KiB blocks: 4096 samples at a time
const BLOCK_SAMPLES: usize = 4096;

fn main() {
    match navtexdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn navtexdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder, writing messages to stdout
    let stdout = io::stdout();
    let mut rx = NavtexReceiverBuilder::new(args.rate)
        .with_only_sitor_b(args.sitor_b)
        .with_reverse(args.reverse)
        .with_center_freq(args.center_freq)
        .with_timeout(args.timeout)
        .with_error_budget(args.error_budget)
        .build(stdout.lock())
        .map_err(|err| CliError::new(err.into(), 2))?;

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let mut inbuf = file_setup(&args, stdin_handle)?;

    // processing: read i16 LE blocks until EOF
    let mut samples = vec![0.0f64; BLOCK_SAMPLES];
    loop {
        let count = read_samples::<LittleEndian, _>(&mut inbuf, &mut samples)
            .context("error reading input samples")?;
        if count == 0 {
            break;
        }
        rx.process(&samples[..count])
            .context("error writing decoded messages")?;
    }

    info!(
        "input exhausted after {} samples",
        rx.input_sample_counter()
    );
    Ok(())
}

// Read up to one block of i16 samples, scaled to [-1.0, 1.0]
//
// Returns the number of samples read; zero means end of input. A
// trailing odd byte is discarded.
fn read_samples<E, R>(source: &mut R, out: &mut [f64]) -> io::Result<usize>
where
    E: byteorder::ByteOrder,
    R: io::BufRead,
{
    let mut raw = vec![0u8; out.len() * 2];
    let mut filled = 0usize;

    // read_exact-style loop that tolerates a short final block
    while filled < raw.len() {
        let n = source.read(&mut raw[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let count = filled / 2;
    for (i, sample) in out.iter_mut().take(count).enumerate() {
        *sample = E::read_i16(&raw[2 * i..]) as f64 / 32767.0;
    }
    Ok(count)
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("navtexold", log_filter)
            .filter_module("navtexdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("NAVTEX decoder reading standard input");
        if !std::io::stdin().is_terminal() {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read audio samples from a terminal.

Pipe a source of raw uncompressed audio from sox, parec, rtl_fm,
or similar into this program."
            ))
        }
    } else {
        info!("NAVTEX decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open file \"{}\"", args.file))?,
        )))
    }
}

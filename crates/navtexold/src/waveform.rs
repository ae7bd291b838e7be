//! Waveform parameters and SITOR-B test synthesis

#[cfg(test)]
use crate::ccir476::{Ccir476, Shift, CODE_ALPHA, CODE_LTRS, CODE_REP};

/// Default carrier center frequency (Hz)
pub const CENTER_FREQ_HZ: f64 = 1000.0;

/// FSK deviation (Hz): mark = center + 85, space = center − 85
pub const DEVIATION_HZ: f64 = 85.0;

/// Baud rate (Hz)
pub const BAUD_HZ: f64 = 100.0;

/// Bit length at the given sampling rate, in fractional samples
///
/// At 11025 Hz a bit is 110.25 samples. The fraction matters: the bit
/// clock tracks real-valued event times, and truncating would cost a
/// bit every few seconds.
pub fn samples_per_bit(fs: u32) -> f64 {
    fs as f64 / BAUD_HZ
}

/// Encode text as CCIR 476 code words with shifts
///
/// The stream leads with a LETTERS shift so the receiver's shift
/// state is defined regardless of where it syncs.
#[cfg(test)]
pub fn encode_text(text: &str) -> Vec<u8> {
    let codec = Ccir476::new();
    let mut shift = Shift::Letters;
    let mut out = vec![CODE_LTRS];
    for ch in text.bytes() {
        codec.char_to_code(&mut out, ch, &mut shift);
    }
    out
}

/// Interleave code words into the SITOR-B alpha/rep slot stream
///
/// Sixteen phasing pairs lead the message.
#[cfg(test)]
pub fn interleave(codes: &[u8]) -> Vec<u8> {
    interleave_with_lead(codes, 16)
}

/// Interleave with a configurable phasing lead
///
/// Each character is transmitted twice: first in a rep slot, then in
/// an alpha slot five character positions later. Unassigned rep slots
/// carry the REP phasing code and unassigned alpha slots the ALPHA
/// phasing code. `lead_pairs` rep/alpha phasing pairs precede the
/// message; a long lead gives a cold receiver time to pull in its
/// bit clock.
#[cfg(test)]
pub fn interleave_with_lead(codes: &[u8], lead_pairs: usize) -> Vec<u8> {
    let lead = 2 * lead_pairs;
    let total = lead + 2 * codes.len() + 5;

    let mut slots: Vec<u8> = (0..total)
        .map(|k| if k % 2 == 0 { CODE_REP } else { CODE_ALPHA })
        .collect();
    for (i, &code) in codes.iter().enumerate() {
        slots[lead + 2 * i] = code; // rep copy
        slots[lead + 2 * i + 5] = code; // alpha copy, 35 bits later
    }
    slots
}

/// Expand code words to ±1.0 bit symbols, least significant bit first
#[cfg(test)]
pub fn codes_to_symbols(codes: &[u8]) -> Vec<f64> {
    let mut out = Vec::with_capacity(codes.len() * 7);
    for &code in codes {
        for bit in 0..7 {
            if (code >> bit) & 1 == 1 {
                out.push(1.0);
            } else {
                out.push(-1.0);
            }
        }
    }
    out
}

/// Continuous-phase FSK modulator for tests
///
/// Bit boundaries fall on fractional samples, exactly as a real
/// 100-baud transmitter at an 11025 Hz capture rate would. A mark
/// symbol (+1) takes the high tone unless `reverse` is set.
#[cfg(test)]
pub fn modulate_fsk(symbols: &[f64], fs: u32, reverse: bool) -> Vec<f64> {
    const TWOPI: f64 = 2.0 * std::f64::consts::PI;

    let (mark_hz, space_hz) = if reverse {
        (CENTER_FREQ_HZ - DEVIATION_HZ, CENTER_FREQ_HZ + DEVIATION_HZ)
    } else {
        (CENTER_FREQ_HZ + DEVIATION_HZ, CENTER_FREQ_HZ - DEVIATION_HZ)
    };

    let bit_samples = samples_per_bit(fs);
    let total = (symbols.len() as f64 * bit_samples).ceil() as usize;

    let mut out = Vec::with_capacity(total);
    let mut phase = 0.0f64;
    for n in 0..total {
        let bit = usize::min((n as f64 / bit_samples) as usize, symbols.len() - 1);
        let freq = if symbols[bit] >= 0.0 { mark_hz } else { space_hz };
        phase += TWOPI * freq / fs as f64;
        if phase > TWOPI {
            phase -= TWOPI;
        }
        out.push(0.5 * phase.sin());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_per_bit() {
        assert_eq!(110.25, samples_per_bit(11025));
        assert_eq!(480.0, samples_per_bit(48000));
    }

    #[test]
    fn test_interleave_structure() {
        let codes = encode_text("NAUTICAL");
        let slots = interleave(&codes);

        // lead is pure phasing
        for pair in 0..16 {
            assert_eq!(CODE_REP, slots[2 * pair]);
            assert_eq!(CODE_ALPHA, slots[2 * pair + 1]);
        }

        // every alpha copy trails its rep by five slots
        for (i, &code) in codes.iter().enumerate() {
            assert_eq!(code, slots[32 + 2 * i]);
            assert_eq!(code, slots[32 + 2 * i + 5]);
        }
    }

    #[test]
    fn test_symbols_lsb_first() {
        // 'A' = 0x47 = 1000111
        let syms = codes_to_symbols(&[0x47]);
        assert_eq!(
            vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 1.0],
            syms
        );
    }

    #[test]
    fn test_modulator_length() {
        let syms = vec![1.0; 100];
        let out = modulate_fsk(&syms, 11025, false);
        assert_eq!(11025, out.len());
        assert!(out.iter().all(|s| s.abs() <= 0.5));
    }
}

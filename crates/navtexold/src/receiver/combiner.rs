//! Time-diversity FEC combiner
//!
//! Every SITOR-B character is transmitted twice: the REP copy first,
//! then the ALPHA copy five character positions (35 bits) later. When
//! the ALPHA copy is damaged, the combiner works through a sequence of
//! progressively more speculative repairs, stopping at the first
//! candidate that passes the 4-of-7 constant-ratio check.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::ccir476::{Ccir476, CODE_REP};

/// Bit offset from an ALPHA position back to its REP copy
pub(crate) const REP_OFFSET: usize = 35;

/// Outcome of one combining attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Combined {
    /// The accepted code word, if any
    pub code: Option<u8>,

    /// Decode quality, which the frame synchronizer subtracts from
    /// its running error count:
    ///
    /// * `+1` — the ALPHA copy alone was valid
    /// * `0` — unmodified REP replacement (or a phase marker skip)
    /// * `-1` — soft FEC calculation was required
    /// * `-2` — hard failure; nothing decodable
    pub success: i32,
}

/// Combine the ALPHA character at `cursor` with its REP copy
///
/// `bits` is the frame synchronizer's soft-bit buffer; `cursor` is
/// the first bit of the ALPHA copy. The repair attempts, in order:
///
/// 1. ALPHA alone valid
/// 2. REP alone valid (a `REP == code_rep` match is a phase marker
///    and is skipped without decoding, preserving the interleave)
/// 3. element-wise sum of the ALPHA and REP soft bits
/// 4. ALPHA with its lowest-confidence bit flipped
/// 5. REP with its lowest-confidence bit flipped
/// 6. the sum with its lowest-confidence bit flipped
///
/// The bit flips mutate `bits` in place; the slots involved are about
/// to be consumed, so nothing downstream sees the mutation.
pub(crate) fn combine(bits: &mut [i32], cursor: usize) -> Combined {
    let code = Ccir476::bytes_to_code(&bits[cursor..cursor + 7]);
    if Ccir476::check_bits(code) {
        return Combined {
            code: Some(code),
            success: 1,
        };
    }

    if cursor < REP_OFFSET {
        // no REP copy in the buffer yet
        return Combined {
            code: None,
            success: -1,
        };
    }
    let rep_pos = cursor - REP_OFFSET;

    let rep = Ccir476::bytes_to_code(&bits[rep_pos..rep_pos + 7]);
    if Ccir476::check_bits(rep) {
        if rep == CODE_REP {
            // the damaged alpha is probably the phase marker; skip it
            // rather than decode and flip the alpha/rep phase
            return Combined {
                code: None,
                success: 0,
            };
        }
        debug!("fec: replacement {:#04x} -> {:#04x}", code, rep);
        return Combined {
            code: Some(rep),
            success: 0,
        };
    }

    // neither copy is valid on its own: sum the soft bits
    let mut sum = [0i32; 7];
    for (i, s) in sum.iter_mut().enumerate() {
        *s = bits[cursor + i] + bits[rep_pos + i];
    }
    let calc = Ccir476::bytes_to_code(&sum);
    if Ccir476::check_bits(calc) {
        debug!("fec: calculation {:#04x} & {:#04x} -> {:#04x}", code, rep, calc);
        return Combined {
            code: Some(calc),
            success: -1,
        };
    }

    flip_smallest_bit(&mut bits[cursor..cursor + 7]);
    let calc = Ccir476::bytes_to_code(&bits[cursor..cursor + 7]);
    if Ccir476::check_bits(calc) {
        debug!("fec: alpha bit flip {:#04x} -> {:#04x}", code, calc);
        return Combined {
            code: Some(calc),
            success: -1,
        };
    }

    flip_smallest_bit(&mut bits[rep_pos..rep_pos + 7]);
    let calc = Ccir476::bytes_to_code(&bits[rep_pos..rep_pos + 7]);
    if Ccir476::check_bits(calc) {
        debug!("fec: rep bit flip {:#04x} -> {:#04x}", rep, calc);
        return Combined {
            code: Some(calc),
            success: -1,
        };
    }

    flip_smallest_bit(&mut sum);
    let calc = Ccir476::bytes_to_code(&sum);
    if Ccir476::check_bits(calc) {
        debug!("fec: sum bit flip -> {:#04x}", calc);
        return Combined {
            code: Some(calc),
            success: -1,
        };
    }

    debug!("fec: decode fail {:#04x}, {:#04x}", code, rep);
    Combined {
        code: None,
        success: -2,
    }
}

// Flip the sign of the least-confident bit
//
// A valid code word has four ones and three zeros. With five ones,
// negating the smallest positive soft bit can restore validity; with
// four zeros, negating the negative soft bit closest to zero can.
// Any other weight is beyond a single flip, and the buffer is left
// alone.
fn flip_smallest_bit(soft: &mut [i32]) {
    let mut min_one: Option<usize> = None;
    let mut min_zero: Option<usize> = None;
    let mut ones = 0;

    for (i, &val) in soft.iter().take(7).enumerate() {
        if val > 0 {
            ones += 1;
            if min_one.map_or(true, |m| val < soft[m]) {
                min_one = Some(i);
            }
        } else if val < 0 && min_zero.map_or(true, |m| val > soft[m]) {
            min_zero = Some(i);
        }
    }

    if ones == 5 {
        if let Some(i) = min_one {
            soft[i] = -soft[i];
        }
    } else if 7 - ones == 4 {
        if let Some(i) = min_zero {
            soft[i] = -soft[i];
        }
    }
}

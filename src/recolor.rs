use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::content_stream::{ContentTokenizer, Token};

/// A CMYK quad on the 0..=10000 integer scale used by the color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CmykColor {
    pub c: i64,
    pub m: i64,
    pub y: i64,
    pub k: i64,
}

/// The print-color lookup table, keyed by a serialized [`ColorKey`] such as
/// `"[0,0,0]"`. It is supplied whole (typically deserialized from JSON) and
/// never mutated by the rewriting pass.
pub type ColorTable = HashMap<String, CmykColor>;

/// An RGB triple rounded onto the 0..=10000 integer scale. Rounding to four
/// decimal digits of precision makes floating-point operands from the
/// renderer comparable against the integer keys of the table.
pub type ColorKey = [i64; 3];

/// Rounds the three [0,1] channels of a fill or stroke color onto the
/// 0..=10000 scale of the color table.
pub fn color_key(red: f64, green: f64, blue: f64) -> ColorKey {
    [
        (red * 10000.0).round() as i64,
        (green * 10000.0).round() as i64,
        (blue * 10000.0).round() as i64,
    ]
}

/// The serialized form of a [`ColorKey`], which is both the lookup key into
/// the [`ColorTable`] and the deduplication key of the warned set.
pub fn serialize_color_key(key: &ColorKey) -> String {
    format!("[{},{},{}]", key[0], key[1], key[2])
}

/// Rewrites the RGB painting operators of one decoded content stream to CMYK
/// through the given color table.
///
/// The pass buffers numeric operands and watches for the `rg` (fill) and `RG`
/// (stroke) operators. A mapped triple is replaced by the four CMYK operands
/// and the corresponding `k`/`K` operator; an unmapped triple is passed
/// through untouched and, when `warn_on_unmapped` is set, logged once per
/// unique rounded color. The `warned` set is owned by the caller so that the
/// deduplication spans every stream of one document run.
///
/// Everything that is not a number or an operator is re-emitted verbatim, so
/// strings, names, dictionaries and inline-image payloads can never be
/// altered. The emitted fragments are joined with single spaces: a stream
/// without any mapped color comes back whitespace-normalized but otherwise
/// identical.
pub fn rewrite_stream(
    content: &[u8],
    color_table: &ColorTable,
    warn_on_unmapped: bool,
    warned_colors: &mut HashSet<String>,
) -> Vec<u8> {
    let mut fragments: Vec<Vec<u8>> = Vec::new();
    // Numeric operands seen since the last operator, oldest first
    let mut pending_numbers: Vec<(f64, Vec<u8>)> = Vec::new();

    for token in ContentTokenizer::new(content) {
        match token {
            Token::Number { value, raw } => {
                pending_numbers.push((value, raw.to_vec()));
            }
            Token::Operator { raw } if (raw == b"rg" || raw == b"RG") && pending_numbers.len() >= 3 => {
                // The last three pending numbers are the color operands; any
                // earlier ones belong to a preceding construct and are
                // flushed unchanged in front of the rewritten triple
                let (blue, blue_raw) = pending_numbers.pop().unwrap_or_default();
                let (green, green_raw) = pending_numbers.pop().unwrap_or_default();
                let (red, red_raw) = pending_numbers.pop().unwrap_or_default();
                for (_, pending_raw) in pending_numbers.drain(..) {
                    fragments.push(pending_raw);
                }

                let key = color_key(red, green, blue);
                let serialized_key = serialize_color_key(&key);
                match color_table.get(&serialized_key) {
                    Some(cmyk) => {
                        for channel in [cmyk.c, cmyk.m, cmyk.y, cmyk.k] {
                            // Back onto the [0,1] operand scale of the stream
                            fragments.push(format!("{}", channel as f64 / 10000.0).into_bytes());
                        }
                        let operator = if raw == b"rg" { b"k".to_vec() } else { b"K".to_vec() };
                        fragments.push(operator);
                    }
                    None => {
                        fragments.push(red_raw);
                        fragments.push(green_raw);
                        fragments.push(blue_raw);
                        fragments.push(raw.to_vec());
                        if warn_on_unmapped && warned_colors.insert(serialized_key) {
                            log::warn!(
                                "No print color registered for {{ r: {}, g: {}, b: {} }}, leaving it untouched",
                                key[0],
                                key[1],
                                key[2]
                            );
                        }
                    }
                }
            }
            Token::Operator { raw } => {
                for (_, pending_raw) in pending_numbers.drain(..) {
                    fragments.push(pending_raw);
                }
                fragments.push(raw.to_vec());
            }
            Token::Other { raw } => {
                for (_, pending_raw) in pending_numbers.drain(..) {
                    fragments.push(pending_raw);
                }
                fragments.push(raw.to_vec());
            }
        }
    }

    // Numbers trailing the last operator are still part of the stream
    for (_, pending_raw) in pending_numbers.drain(..) {
        fragments.push(pending_raw);
    }

    fragments.join(&b' ')
}

//! RefPack (LZ77-family) chunk decompressor.
//!
//! A compressed chunk is a sequence of decode steps. Each step starts with a
//! control byte whose value range selects how many operand bytes follow and
//! how the literal count, copy length and copy distance are packed:
//!
//! | Control     | Operands | Literals              | Copy length                  | Distance                               |
//! |-------------|----------|-----------------------|------------------------------|----------------------------------------|
//! | `0x00-0x7F` | 1        | `C & 3`               | `((C >> 2) & 7) + 3`         | `((C & 0x60) << 3) + B + 1`            |
//! | `0x80-0xBF` | 2        | `B >> 6`              | `(C & 0x3F) + 4`             | `((B & 0x3F) << 8) + D + 1`            |
//! | `0xC0-0xDF` | 3        | `C & 3`               | `((C & 0x0C) << 6) + E + 5`  | `((C & 0x10) << 12) + (B << 8) + D + 1` |
//! | `0xE0-0xFB` | 0        | `((C & 0x1F) << 2) + 4` | -                          | -                                      |
//! | `0xFC-0xFF` | 0        | `C & 3`               | - (stream ends)              | -                                      |
//!
//! The stream terminates itself with a `0xFC-0xFF` step, so no output length
//! is passed in. Back-references only see output produced by the same call:
//! every chunk is decoded with a fresh window.

use thiserror::Error;

/// Errors raised while decoding a single chunk.
///
/// Offsets are relative to the start of the compressed input and point at
/// the control byte of the failing step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A step needs more input bytes than remain.
    #[error(
        "malformed stream at offset {offset:#x}: step needs {need} more bytes, {have} available"
    )]
    MalformedStream {
        offset: usize,
        need: usize,
        have: usize,
    },

    /// A back-reference reaches before the start of the output.
    #[error(
        "corrupt back-reference at offset {offset:#x}: distance {distance} exceeds {written} bytes written"
    )]
    CorruptReference {
        offset: usize,
        distance: usize,
        written: usize,
    },
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    literals: usize,
    length: usize,
    distance: usize,
    last: bool,
}

impl Step {
    /// Number of operand bytes that follow `control`.
    fn operand_len(control: u8) -> usize {
        match control {
            0x00..=0x7F => 1,
            0x80..=0xBF => 2,
            0xC0..=0xDF => 3,
            _ => 0,
        }
    }

    fn decode(control: u8, operands: &[u8]) -> Self {
        let c = control as usize;
        match control {
            0x00..=0x7F => {
                let b = operands[0] as usize;
                Self {
                    literals: c & 0x03,
                    length: ((c >> 2) & 0x07) + 3,
                    distance: ((c & 0x60) << 3) + b + 1,
                    last: false,
                }
            }
            0x80..=0xBF => {
                let (b, d) = (operands[0] as usize, operands[1] as usize);
                Self {
                    literals: b >> 6,
                    length: (c & 0x3F) + 4,
                    distance: ((b & 0x3F) << 8) + d + 1,
                    last: false,
                }
            }
            0xC0..=0xDF => {
                let (b, d, e) = (
                    operands[0] as usize,
                    operands[1] as usize,
                    operands[2] as usize,
                );
                Self {
                    literals: c & 0x03,
                    length: ((c & 0x0C) << 6) + e + 5,
                    distance: ((c & 0x10) << 12) + (b << 8) + d + 1,
                    last: false,
                }
            }
            0xE0..=0xFB => Self {
                literals: ((c & 0x1F) << 2) + 4,
                length: 0,
                distance: 0,
                last: false,
            },
            0xFC..=0xFF => Self {
                literals: c & 0x03,
                length: 0,
                distance: 0,
                last: true,
            },
        }
    }
}

/// Decompress one RefPack chunk.
///
/// # Errors
///
/// - [`CodecError::MalformedStream`] if a control byte, its operands or its
///   literal run are cut off, or the input ends without a terminal step.
/// - [`CodecError::CorruptReference`] if a copy distance exceeds the number of
///   bytes decoded so far.
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(2));
    let mut pos = 0usize;

    loop {
        let offset = pos;
        let Some(&control) = compressed.get(pos) else {
            return Err(CodecError::MalformedStream {
                offset,
                need: 1,
                have: 0,
            });
        };
        pos += 1;

        let operand_len = Step::operand_len(control);
        let operands = take(compressed, pos, operand_len, offset)?;
        pos += operand_len;
        let step = Step::decode(control, operands);

        let literals = take(compressed, pos, step.literals, offset)?;
        out.extend_from_slice(literals);
        pos += step.literals;

        if step.last {
            return Ok(out);
        }

        if step.length > 0 {
            if step.distance > out.len() {
                return Err(CodecError::CorruptReference {
                    offset,
                    distance: step.distance,
                    written: out.len(),
                });
            }

            // Source and destination may overlap, so copy forward one byte at a time.
            let start = out.len() - step.distance;
            out.reserve(step.length);
            for i in 0..step.length {
                let byte = out[start + i];
                out.push(byte);
            }
        }
    }
}

fn take(input: &[u8], pos: usize, len: usize, offset: usize) -> Result<&[u8], CodecError> {
    let have = input.len().saturating_sub(pos);
    if len > have {
        return Err(CodecError::MalformedStream {
            offset,
            need: len,
            have,
        });
    }
    Ok(&input[pos..pos + len])
}

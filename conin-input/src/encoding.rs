// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Code page conversions between UTF-16 and narrow byte text.

use encoding_rs::{DecoderResult, EncoderResult, Encoding};

use crate::error::ConversionError;

/// Written in place of characters the code page cannot represent.
const UNMAPPABLE_REPLACEMENT: u8 = b'?';

/// The encoding behind `code_page`. Only encodings that write back the bytes
/// they read qualify, which rules out the UTF-16 code pages.
///
/// # Errors
/// Returns [`ConversionError::UnsupportedCodePage`] when there is no encoding
/// table for `code_page`.
pub fn encoding_for_code_page(code_page: u32) -> Result<&'static Encoding, ConversionError> {
    u16::try_from(code_page)
        .ok()
        .and_then(codepage::to_encoding)
        .filter(|encoding| encoding.output_encoding() == *encoding)
        .ok_or(ConversionError::UnsupportedCodePage(code_page))
}

/// Encode `src` into `dst` and return the number of bytes written.
///
/// The whole of `src` is converted or nothing is: when it does not fit the
/// contents of `dst` are unspecified and the caller is expected to retry with
/// smaller pieces.
///
/// # Errors
/// [`ConversionError::InsufficientBuffer`] when `dst` is too small, and
/// [`ConversionError::UnsupportedCodePage`] for an unknown code page.
pub fn encode_utf16(code_page: u32, src: &[u16], dst: &mut [u8]) -> Result<usize, ConversionError> {
    let mut encoder = encoding_for_code_page(code_page)?.new_encoder();
    let mut read = 0;
    let mut written = 0;

    loop {
        let (result, r, w) =
            encoder.encode_from_utf16_without_replacement(&src[read..], &mut dst[written..], true);
        read += r;
        written += w;

        match result {
            EncoderResult::InputEmpty => return Ok(written),
            EncoderResult::OutputFull => return Err(ConversionError::InsufficientBuffer),
            EncoderResult::Unmappable(_) => {
                let Some(slot) = dst.get_mut(written) else {
                    return Err(ConversionError::InsufficientBuffer);
                };
                *slot = UNMAPPABLE_REPLACEMENT;
                written += 1;
            }
        }
    }
}

/// Decode narrow text. Malformed sequences become U+FFFD.
///
/// # Errors
/// [`ConversionError::UnsupportedCodePage`] for an unknown code page.
pub fn decode_to_utf16(code_page: u32, bytes: &[u8]) -> Result<Vec<u16>, ConversionError> {
    let (text, had_errors) = encoding_for_code_page(code_page)?.decode_without_bom_handling(bytes);
    if had_errors {
        debug!("Replaced malformed input while decoding code page {code_page}");
    }

    Ok(text.encode_utf16().collect())
}

/// Whether `byte` starts a multi-byte sequence in `code_page`, i.e. it only
/// decodes once more bytes follow.
///
/// # Errors
/// [`ConversionError::UnsupportedCodePage`] for an unknown code page.
pub fn is_lead_byte(code_page: u32, byte: u8) -> Result<bool, ConversionError> {
    let mut decoder = encoding_for_code_page(code_page)?.new_decoder_without_bom_handling();
    let mut out = [0u16; 2];
    let (result, _, written) = decoder.decode_to_utf16_without_replacement(&[byte], &mut out, false);

    Ok(matches!(result, DecoderResult::InputEmpty) && written == 0)
}

/// Length in UTF-16 units of the code point starting `units`: 2 for a
/// complete surrogate pair, otherwise 1. Empty input has length 0.
#[must_use]
pub fn code_point_len(units: &[u16]) -> usize {
    match units {
        [] => 0,
        [high, low, ..] if is_high_surrogate(*high) && is_low_surrogate(*low) => 2,
        _ => 1,
    }
}

const fn is_high_surrogate(unit: u16) -> bool {
    matches!(unit, 0xD800..=0xDBFF)
}

const fn is_low_surrogate(unit: u16) -> bool {
    matches!(unit, 0xDC00..=0xDFFF)
}

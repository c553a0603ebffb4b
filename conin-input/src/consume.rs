// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Handing queued text to clients, in UTF-16 or in the active code page.

use crate::{
    encoding,
    error::{ConversionError, InputBufferError},
    input_buffer::InputBuffer,
    reading_mode::ReadingMode,
};

/// Largest encoding of one code point in any supported code page.
const SCRATCH_LEN: usize = 8;

/// A client's destination for a text read. Filling it advances the slice, so
/// after a read only the unfilled tail is left.
#[derive(Debug)]
pub enum TextBuffer<'a> {
    Wide(&'a mut [u16]),
    Narrow(&'a mut [u8]),
}

impl TextBuffer<'_> {
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Self::Wide(_))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Wide(buf) => buf.len(),
            Self::Narrow(buf) => buf.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Copy as much of `src` into `dest` as fits and advance `dest` past it.
fn transfer<T: Copy>(dest: &mut &mut [T], src: &[T]) -> usize {
    let count = dest.len().min(src.len());
    let (head, rest) = std::mem::take(dest).split_at_mut(count);
    head.copy_from_slice(&src[..count]);
    *dest = rest;
    count
}

impl InputBuffer {
    /// Hand out text converted by an earlier read of the same width.
    pub fn consume_cached(&mut self, target: &mut TextBuffer<'_>) {
        self.switch_reading_mode(ReadingMode::text(target.is_wide()));

        match target {
            TextBuffer::Wide(dest) => {
                if !self.cached_text_wide.is_empty() {
                    let count = transfer(dest, self.cached_text_wide.as_slice());
                    self.cached_text_wide.advance(count);
                }
            }
            TextBuffer::Narrow(dest) => {
                if !self.cached_text_narrow.is_empty() {
                    let count = transfer(dest, self.cached_text_narrow.as_slice());
                    self.cached_text_narrow.advance(count);
                }
            }
        }
    }

    /// Move `source` into `target`, converting to the active code page for
    /// narrow targets. Both are advanced past what was handed out.
    ///
    /// A character whose encoding only partly fits is still consumed from
    /// `source`: the bytes that did not fit are kept for the next narrow read.
    ///
    /// # Errors
    /// Conversion failures other than running out of room in `target`.
    pub fn consume(
        &mut self,
        source: &mut &[u16],
        target: &mut TextBuffer<'_>,
    ) -> Result<(), ConversionError> {
        self.consume_cached(target);

        if source.is_empty() || target.is_empty() {
            return Ok(());
        }

        match target {
            TextBuffer::Wide(dest) => {
                let current: &[u16] = *source;
                let count = transfer(dest, current);
                *source = &current[count..];
                Ok(())
            }
            TextBuffer::Narrow(dest) => self.consume_narrow(source, dest),
        }
    }

    fn consume_narrow(
        &mut self,
        source: &mut &[u16],
        dest: &mut &mut [u8],
    ) -> Result<(), ConversionError> {
        let code_page = self.code_page();

        match encoding::encode_utf16(code_page, source, dest) {
            Ok(written) => {
                let (_, rest) = std::mem::take(dest).split_at_mut(written);
                *dest = rest;
                *source = &[];
                return Ok(());
            }
            Err(ConversionError::InsufficientBuffer) => {}
            Err(e) => return Err(e),
        }

        let mut scratch = [0u8; SCRATCH_LEN];
        while !source.is_empty() {
            let current: &[u16] = *source;
            let (code_point, rest) = current.split_at(encoding::code_point_len(current));

            let written = encoding::encode_utf16(code_page, code_point, &mut scratch)?;
            let encoded = &scratch[..written];
            let copied = transfer(dest, encoded);
            *source = rest;

            if dest.is_empty() {
                if copied < encoded.len() {
                    trace!(
                        "Caching {} bytes of a split character",
                        encoded.len() - copied
                    );
                    self.cached_text_narrow.replace(&encoded[copied..]);
                }
                break;
            }
        }

        Ok(())
    }

    /// Keep UTF-16 a read could not hand out, after anything already kept.
    pub fn cache_wide_text(&mut self, text: &[u16]) {
        self.cached_text_wide.append(text);
    }

    /// Fill `target` from the caches and then from the queue. Returns the
    /// number of units written: UTF-16 units for wide targets, bytes for
    /// narrow ones.
    ///
    /// # Errors
    /// Conversion failures for narrow targets. Whatever was taken from the
    /// queue but not delivered stays cached.
    pub fn read_text(&mut self, target: &mut TextBuffer<'_>) -> Result<usize, InputBufferError> {
        let capacity = target.len();
        self.consume_cached(target);

        let mut pending = Vec::new();
        while !target.is_empty() {
            if self.cached_text_wide.is_empty() {
                pending.resize(target.len(), 0);
                let read = self.read_wide_text(&mut pending);
                pending.truncate(read);
            } else {
                pending = self.cached_text_wide.take();
            }

            if pending.is_empty() {
                break;
            }

            let mut source: &[u16] = &pending;
            let result = self.consume(&mut source, target);
            if !source.is_empty() {
                self.cache_wide_text(source);
            }
            result?;
        }

        Ok(capacity - target.len())
    }
}

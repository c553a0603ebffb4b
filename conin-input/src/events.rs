// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Handing queued input to clients as records.
//!
//! Narrow readers see one record per code page byte, so a single queued key
//! can expand into several records. Whatever does not fit the client's
//! buffer waits in the event cache for the next event read.

use conin_common::input_record::{InputRecord, KeyEvent};

use crate::{
    encoding,
    error::{ConversionError, InputBufferError},
    input_buffer::InputBuffer,
    reading_mode::ReadingMode,
};

/// Largest encoding of one code point in any supported code page.
const SCRATCH_LEN: usize = 8;

/// The narrow form of `record`: key records with a character become one
/// record per code page byte, everything else is unchanged.
///
/// # Errors
/// [`ConversionError::UnsupportedCodePage`] for an unknown code page.
pub fn narrow_records(
    code_page: u32,
    record: &InputRecord,
) -> Result<Vec<InputRecord>, ConversionError> {
    let InputRecord::Key(key) = record else {
        return Ok(vec![*record]);
    };

    if key.unicode_char == 0 {
        return Ok(vec![*record]);
    }

    narrow_key(code_page, key, &[key.unicode_char])
}

/// The narrow form of a run of queued records. A key record holding a high
/// surrogate and the key record after it holding the low surrogate are
/// encoded as one character, carried on the first record's fields.
///
/// # Errors
/// [`ConversionError::UnsupportedCodePage`] for an unknown code page.
pub fn narrow_queued_records(
    code_page: u32,
    records: &[InputRecord],
) -> Result<Vec<InputRecord>, ConversionError> {
    let mut narrow = Vec::with_capacity(records.len());
    let mut records = records.iter().peekable();

    while let Some(record) = records.next() {
        match (record, records.peek()) {
            (InputRecord::Key(high), Some(InputRecord::Key(low)))
                if is_surrogate_pair(high, low) =>
            {
                let pair = [high.unicode_char, low.unicode_char];
                narrow.extend(narrow_key(code_page, high, &pair)?);
                records.next();
            }
            _ => narrow.extend(narrow_records(code_page, record)?),
        }
    }

    Ok(narrow)
}

fn narrow_key(
    code_page: u32,
    key: &KeyEvent,
    units: &[u16],
) -> Result<Vec<InputRecord>, ConversionError> {
    let mut scratch = [0u8; SCRATCH_LEN];
    let written = encoding::encode_utf16(code_page, units, &mut scratch)?;

    Ok(scratch[..written]
        .iter()
        .map(|&byte| {
            InputRecord::Key(KeyEvent {
                unicode_char: u16::from(byte),
                ..*key
            })
        })
        .collect())
}

const fn is_surrogate_pair(high: &KeyEvent, low: &KeyEvent) -> bool {
    high.key_down == low.key_down
        && matches!(high.unicode_char, 0xD800..=0xDBFF)
        && matches!(low.unicode_char, 0xDC00..=0xDFFF)
}

/// Whether `record` holds the first half of a surrogate pair.
const fn starts_surrogate_pair(record: &InputRecord) -> bool {
    matches!(record, InputRecord::Key(key) if matches!(key.unicode_char, 0xD800..=0xDBFF))
}

impl InputBuffer {
    /// Fill `dest` with records: first any cached from an earlier narrow
    /// read, then from the queue. Returns the number of records written.
    ///
    /// # Errors
    /// [`ConversionError::UnsupportedCodePage`] for narrow reads with an
    /// unknown code page. The queue is not touched in that case.
    pub fn read_events(
        &mut self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError> {
        self.switch_reading_mode(ReadingMode::events(wide));

        let mut filled = self.drain_cached_events(dest);
        if filled == dest.len() {
            return Ok(filled);
        }

        if wide {
            filled += self.read_records(&mut dest[filled..]);
            return Ok(filled);
        }

        let code_page = self.code_page();
        encoding::encoding_for_code_page(code_page)?;

        let mut queued = vec![InputRecord::default(); dest.len() - filled];
        let read = self.read_records(&mut queued);
        queued.truncate(read);

        // the low half of a pair cut off by the destination comes along
        if let Some(&InputRecord::Key(high)) = queued.last().filter(|r| starts_surrogate_pair(r))
        {
            let mut next = [InputRecord::default()];
            if self.peek_records(&mut next) == 1 {
                if let InputRecord::Key(low) = next[0] {
                    if is_surrogate_pair(&high, &low) {
                        self.read_records(&mut next);
                        queued.push(next[0]);
                    }
                }
            }
        }

        for narrow in narrow_queued_records(code_page, &queued)? {
            if filled < dest.len() {
                dest[filled] = narrow;
                filled += 1;
            } else {
                self.cached_input_events.push_back(narrow);
            }
        }

        if !self.cached_input_events.is_empty() {
            trace!(
                "{} narrow records cached for the next read",
                self.cached_input_events.len()
            );
        }

        Ok(filled)
    }

    /// Like [`Self::read_events`], but nothing is consumed and nothing new
    /// is cached.
    ///
    /// # Errors
    /// [`ConversionError::UnsupportedCodePage`] for narrow peeks with an
    /// unknown code page.
    pub fn peek_events(
        &mut self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError> {
        self.switch_reading_mode(ReadingMode::events(wide));

        let mut filled = 0;
        for (slot, record) in dest.iter_mut().zip(self.cached_input_events.iter()) {
            *slot = *record;
            filled += 1;
        }

        if filled == dest.len() {
            return Ok(filled);
        }

        if wide {
            filled += self.peek_records(&mut dest[filled..]);
            return Ok(filled);
        }

        let code_page = self.code_page();
        let wanted = dest.len() - filled;
        let mut queued = vec![InputRecord::default(); wanted + 1];
        let peeked = self.peek_records(&mut queued);
        queued.truncate(peeked);

        // one record past the window, kept only if it finishes a pair
        if queued.len() > wanted {
            let keep = matches!(
                (&queued[wanted - 1], &queued[wanted]),
                (InputRecord::Key(high), InputRecord::Key(low)) if is_surrogate_pair(high, low)
            );
            if !keep {
                queued.truncate(wanted);
            }
        }

        for (slot, narrow) in dest[filled..]
            .iter_mut()
            .zip(narrow_queued_records(code_page, &queued)?)
        {
            *slot = narrow;
            filled += 1;
        }

        Ok(filled)
    }

    /// Keep the first `expected` records of `records` and put the rest back
    /// in front of the event cache.
    pub fn trim_events(&mut self, wide: bool, records: &mut Vec<InputRecord>, expected: usize) {
        self.switch_reading_mode(ReadingMode::events(wide));

        if records.len() <= expected {
            return;
        }

        let extra = records.split_off(expected);
        trace!("Caching {} records beyond the {expected} expected", extra.len());

        for record in extra.into_iter().rev() {
            self.cached_input_events.push_front(record);
        }
    }

    /// Move up to `count` cached records to the end of `target`. Returns how
    /// many were moved.
    pub fn consume_cached_events(
        &mut self,
        wide: bool,
        count: usize,
        target: &mut Vec<InputRecord>,
    ) -> usize {
        self.switch_reading_mode(ReadingMode::events(wide));

        let count = count.min(self.cached_input_events.len());
        target.extend(self.cached_input_events.drain(..count));
        count
    }

    /// Copy up to `count` cached records to the end of `target`.
    pub fn peek_cached_events(
        &mut self,
        wide: bool,
        count: usize,
        target: &mut Vec<InputRecord>,
    ) -> usize {
        self.switch_reading_mode(ReadingMode::events(wide));

        let before = target.len();
        target.extend(self.cached_input_events.iter().take(count).copied());
        target.len() - before
    }

    fn drain_cached_events(&mut self, dest: &mut [InputRecord]) -> usize {
        let count = dest.len().min(self.cached_input_events.len());
        for (slot, record) in dest.iter_mut().zip(self.cached_input_events.drain(..count)) {
            *slot = record;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use conin_common::control_keys::ControlKeyState;

    use super::*;
    use crate::host::HostServices;

    fn key(ch: u16) -> InputRecord {
        InputRecord::synthesize_key_event(true, 1, 0x41, 0x1e, ch, ControlKeyState::SHIFT_PRESSED)
    }

    #[test]
    fn narrow_records_keep_key_fields() {
        let records = narrow_records(1252, &key(0x20AC)).unwrap();
        assert_eq!(records.len(), 1);
        let narrowed = records[0].as_key_event().unwrap();
        assert_eq!(narrowed.unicode_char, 0x80);
        assert_eq!(narrowed.virtual_key_code, 0x41);
        assert_eq!(narrowed.control_key_state, ControlKeyState::SHIFT_PRESSED);
    }

    #[test]
    fn narrow_records_expand_multibyte_characters() {
        let records = narrow_records(65001, &key(0x00E9)).unwrap();
        let bytes: Vec<u16> = records
            .iter()
            .filter_map(|r| r.as_key_event().map(|k| k.unicode_char))
            .collect();
        assert_eq!(bytes, vec![0xC3, 0xA9]);
    }

    #[test]
    fn narrow_records_pass_through_non_keys() {
        assert_eq!(
            narrow_records(1252, &InputRecord::Menu(4)).unwrap(),
            vec![InputRecord::Menu(4)]
        );
        assert_eq!(narrow_records(1252, &key(0)).unwrap(), vec![key(0)]);
    }

    #[test]
    fn narrow_read_caches_overflowing_bytes() {
        let mut buf = InputBuffer::new(HostServices::detached(65001));
        buf.write_event(key(0x00E9));

        let mut out = [InputRecord::default(); 1];
        assert_eq!(buf.read_events(false, &mut out).unwrap(), 1);
        assert_eq!(out[0].as_key_event().map(|k| k.unicode_char), Some(0xC3));
        assert_eq!(buf.cached_input_events.len(), 1);
        assert_eq!(buf.number_of_ready_events(), 1);

        assert_eq!(buf.read_events(false, &mut out).unwrap(), 1);
        assert_eq!(out[0].as_key_event().map(|k| k.unicode_char), Some(0xA9));
        assert!(buf.cached_input_events.is_empty());
    }

    fn narrow_chars(records: &[InputRecord]) -> Vec<u16> {
        records
            .iter()
            .filter_map(|r| r.as_key_event().map(|k| k.unicode_char))
            .collect()
    }

    #[test]
    fn narrow_read_encodes_surrogate_pairs_together() {
        let mut buf = InputBuffer::new(HostServices::detached(65001));
        buf.write_str("\u{1F600}");

        let mut out = [InputRecord::default(); 8];
        assert_eq!(buf.read_events(false, &mut out).unwrap(), 4);
        assert_eq!(narrow_chars(&out[..4]), vec![0xF0, 0x9F, 0x98, 0x80]);
        assert!(!buf.has_events_available());
    }

    #[test]
    fn narrow_read_pulls_in_the_low_surrogate_past_the_destination() {
        let mut buf = InputBuffer::new(HostServices::detached(65001));
        buf.write_str("a\u{1F600}b");

        let mut out = [InputRecord::default(); 2];
        assert_eq!(buf.read_events(false, &mut out).unwrap(), 2);
        assert_eq!(narrow_chars(&out), vec![0x61, 0xF0]);
        assert_eq!(buf.cached_input_events.len(), 3);
        assert_eq!(buf.text.len(), 1);

        let mut rest = [InputRecord::default(); 8];
        assert_eq!(buf.read_events(false, &mut rest).unwrap(), 4);
        assert_eq!(narrow_chars(&rest[..4]), vec![0x9F, 0x98, 0x80, 0x62]);
    }

    #[test]
    fn narrow_peek_encodes_surrogate_pairs_together() {
        let mut buf = InputBuffer::new(HostServices::detached(65001));
        buf.write_str("\u{1F600}");

        let mut out = [InputRecord::default(); 1];
        assert_eq!(buf.peek_events(false, &mut out).unwrap(), 1);
        assert_eq!(narrow_chars(&out), vec![0xF0]);
        assert_eq!(buf.text.len(), 2);
    }

    #[test]
    fn queued_pairs_keep_the_first_records_fields() {
        let high = key(0xD83D);
        let low = InputRecord::synthesize_key_event(true, 1, 0, 0, 0xDE00, ControlKeyState::empty());
        let records = narrow_queued_records(65001, &[high, low]).unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r
            .as_key_event()
            .is_some_and(|k| k.virtual_key_code == 0x41)));
    }

    #[test]
    fn narrow_read_with_unknown_code_page_leaves_queue() {
        let mut buf = InputBuffer::new(HostServices::detached(1));
        buf.write_event(key(0x41));

        let mut out = [InputRecord::default(); 1];
        assert!(buf.read_events(false, &mut out).is_err());
        assert_eq!(buf.records.len(), 1);
    }

    #[test]
    fn narrow_peek_does_not_cache() {
        let mut buf = InputBuffer::new(HostServices::detached(65001));
        buf.write_event(key(0x00E9));

        let mut out = [InputRecord::default(); 1];
        assert_eq!(buf.peek_events(false, &mut out).unwrap(), 1);
        assert!(buf.cached_input_events.is_empty());
        assert_eq!(buf.records.len(), 1);
    }

    #[test]
    fn trim_moves_extras_to_the_front() {
        let mut buf = InputBuffer::new(HostServices::detached(1252));
        buf.cached_input_events.push_back(InputRecord::Menu(9));

        let mut records = vec![
            InputRecord::Menu(1),
            InputRecord::Menu(2),
            InputRecord::Menu(3),
        ];
        buf.trim_events(true, &mut records, 1);
        assert_eq!(records, vec![InputRecord::Menu(1)]);
        assert_eq!(
            buf.cached_input_events.iter().copied().collect::<Vec<_>>(),
            vec![
                InputRecord::Menu(2),
                InputRecord::Menu(3),
                InputRecord::Menu(9)
            ]
        );
        assert_eq!(buf.reading_mode(), ReadingMode::WideEvents);
    }

    #[test]
    fn cached_events_peek_then_consume() {
        let mut buf = InputBuffer::new(HostServices::detached(1252));
        buf.cached_input_events.extend([InputRecord::Menu(1), InputRecord::Menu(2)]);

        let mut peeked = Vec::new();
        assert_eq!(buf.peek_cached_events(false, 5, &mut peeked), 2);
        assert_eq!(buf.cached_input_events.len(), 2);

        let mut consumed = Vec::new();
        assert_eq!(buf.consume_cached_events(false, 1, &mut consumed), 1);
        assert_eq!(consumed, vec![InputRecord::Menu(1)]);
        assert_eq!(buf.cached_input_events.len(), 1);
        assert_eq!(buf.reading_mode(), ReadingMode::NarrowEvents);
    }
}

// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::VecDeque;

use conin_buffer::ring_buffer::RingBuffer;
use conin_common::{
    control_keys::ControlKeyState,
    input_mode::InputMode,
    input_record::{Coord, InputRecord, KeyEvent},
};

use crate::{
    encoding,
    error::ConversionError,
    host::{HostServices, WaitTerminationReason},
    reading_mode::{ReadingMode, TextCache},
    span::{SpanIndex, SpanKind},
};

/// The pending input of one console.
///
/// Text and input records are kept in separate rings, each in the shape it
/// was written in. The span index remembers the order in which the runs
/// arrived so that reads hand everything out in write order, converting only
/// what the reader asks for in the other shape.
///
/// There is no locking in here. The owner serializes every call, see
/// [`crate::session::ConsoleSession`].
#[derive(Debug)]
pub struct InputBuffer {
    pub(crate) text: RingBuffer<u16>,
    pub(crate) records: RingBuffer<InputRecord>,
    pub(crate) spans: SpanIndex,

    pub(crate) reading_mode: ReadingMode,
    /// Code page bytes converted by a narrow text read that did not fit.
    pub(crate) cached_text_narrow: TextCache<u8>,
    /// UTF-16 read from the queue but not yet handed to a client.
    pub(crate) cached_text_wide: TextCache<u16>,
    /// Records converted by an event read that did not fit.
    pub(crate) cached_input_events: VecDeque<InputRecord>,

    /// Lead byte of a narrow key sequence waiting for its trail byte.
    write_partial_byte_sequence: Option<InputRecord>,
    /// The last narrow key-down that was widened, for its key-up.
    last_widened_key: Option<WidenedKey>,
    input_mode: InputMode,
    host: HostServices,
}

impl InputBuffer {
    #[must_use]
    pub fn new(host: HostServices) -> Self {
        Self::with_input_mode(host, InputMode::default())
    }

    #[must_use]
    pub fn with_input_mode(host: HostServices, input_mode: InputMode) -> Self {
        Self {
            text: RingBuffer::new(),
            records: RingBuffer::new(),
            spans: SpanIndex::new(),
            reading_mode: ReadingMode::default(),
            cached_text_narrow: TextCache::new(),
            cached_text_wide: TextCache::new(),
            cached_input_events: VecDeque::new(),
            write_partial_byte_sequence: None,
            last_widened_key: None,
            input_mode,
            host,
        }
    }

    #[must_use]
    pub const fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn set_input_mode(&mut self, input_mode: InputMode) {
        debug!("Input mode {:?} -> {:?}", self.input_mode, input_mode);
        self.input_mode = input_mode;
    }

    #[must_use]
    pub const fn is_in_vt_input_mode(&self) -> bool {
        self.input_mode.contains(InputMode::VIRTUAL_TERMINAL_INPUT)
    }

    #[must_use]
    pub const fn reading_mode(&self) -> ReadingMode {
        self.reading_mode
    }

    /// Arrival order of the queued runs.
    #[must_use]
    pub const fn spans(&self) -> &SpanIndex {
        &self.spans
    }

    #[must_use]
    pub fn code_page(&self) -> u32 {
        self.host.code_page.current_code_page()
    }

    /// Change the reading mode. Any change drops both text caches, even when
    /// only the width changes.
    pub fn switch_reading_mode(&mut self, mode: ReadingMode) {
        if self.reading_mode != mode {
            self.switch_reading_mode_slow_path(mode);
        }
    }

    fn switch_reading_mode_slow_path(&mut self, mode: ReadingMode) {
        if !self.cached_text_narrow.is_empty() || !self.cached_text_wide.is_empty() {
            debug!(
                "Dropping {} narrow and {} wide cached units on switch to {mode:?}",
                self.cached_text_narrow.len(),
                self.cached_text_wide.len()
            );
        }

        self.cached_text_narrow.release();
        self.cached_text_wide.release();
        self.reading_mode = mode;
    }

    // ────────────────────────────────────────────────────────────────
    // WRITING
    // ────────────────────────────────────────────────────────────────

    pub fn write_events(&mut self, records: &[InputRecord]) {
        if records.is_empty() {
            return;
        }

        self.records.write_slice(records);
        self.append_span(SpanKind::Record, records.len());
    }

    pub fn write_event(&mut self, record: InputRecord) {
        self.write_events(&[record]);
    }

    pub fn write_text(&mut self, text: &[u16]) {
        if text.is_empty() {
            return;
        }

        self.text.write_slice(text);
        self.append_span(SpanKind::Text, text.len());
    }

    pub fn write_str(&mut self, text: &str) {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.write_text(&units);
    }

    /// Queue code page text, decoded with the active code page.
    pub fn write_narrow_text(&mut self, bytes: &[u8]) {
        match encoding::decode_to_utf16(self.code_page(), bytes) {
            Ok(text) => self.write_text(&text),
            Err(e) => error!("Failed to queue narrow text: {e}"),
        }
    }

    /// Queue records whose key characters are code page bytes.
    ///
    /// The lead byte of a key-down is held back until the key-down carrying
    /// its trail byte arrives; the pair then becomes a single wide key
    /// record. Key-ups never complete a pair and carry the character of the
    /// key-down they release.
    pub fn write_narrow_events(&mut self, records: &[InputRecord]) {
        let code_page = self.code_page();
        let mut converted = Vec::with_capacity(records.len());

        for record in records {
            match self.widen_record(code_page, record) {
                Ok(wide) => converted.extend(wide),
                Err(e) => error!("Failed to convert narrow record {record}: {e}"),
            }
        }

        self.write_events(&converted);
    }

    fn widen_record(
        &mut self,
        code_page: u32,
        record: &InputRecord,
    ) -> Result<Vec<InputRecord>, ConversionError> {
        let InputRecord::Key(key) = record else {
            return Ok(vec![*record]);
        };

        let byte = narrow_byte(key);
        if byte == 0 {
            return Ok(vec![*record]);
        }

        if !key.key_down {
            let unicode_char = self.key_up_char(code_page, byte)?;
            return Ok(vec![InputRecord::Key(KeyEvent {
                unicode_char,
                ..*key
            })]);
        }

        let (lead, bytes) = if let Some(lead) = self.fetch_write_partial_byte_sequence() {
            let lead = lead.as_key_event().map_or(0, narrow_byte);
            (Some(lead), vec![lead, byte])
        } else if encoding::is_lead_byte(code_page, byte)? {
            trace!("Holding lead byte {byte:#04x} until its trail byte arrives");
            self.store_write_partial_byte_sequence(*record);
            return Ok(Vec::new());
        } else {
            (None, vec![byte])
        };

        let units = encoding::decode_to_utf16(code_page, &bytes)?;
        self.last_widened_key = units.first().map(|&unicode_char| WidenedKey {
            lead,
            trail: byte,
            unicode_char,
        });

        Ok(units
            .into_iter()
            .map(|unicode_char| {
                InputRecord::Key(KeyEvent {
                    unicode_char,
                    ..*key
                })
            })
            .collect())
    }

    /// The character a narrow key-up carrying `byte` releases. The key-up of
    /// a lead byte whose character is not known yet carries none.
    fn key_up_char(&self, code_page: u32, byte: u8) -> Result<u16, ConversionError> {
        if let Some(widened) = self.last_widened_key.filter(|widened| widened.releases(byte)) {
            return Ok(widened.unicode_char);
        }

        if encoding::is_lead_byte(code_page, byte)? {
            return Ok(0);
        }

        let units = encoding::decode_to_utf16(code_page, &[byte])?;
        Ok(units.first().copied().unwrap_or(0))
    }

    pub fn write_focus_event(&mut self, focused: bool) {
        self.write_event(InputRecord::synthesize_focus_event(focused));
    }

    /// Queue a mouse record if the console accepts mouse input. Returns
    /// whether it was queued.
    pub fn write_mouse_event(
        &mut self,
        position: Coord,
        button_state: u32,
        control_key_state: ControlKeyState,
        event_flags: u32,
    ) -> bool {
        if !self.input_mode.contains(InputMode::MOUSE_INPUT) {
            trace!("Mouse input disabled, dropping mouse event at {position:?}");
            return false;
        }

        self.write_event(InputRecord::synthesize_mouse_event(
            position,
            button_state,
            control_key_state,
            event_flags,
        ));
        true
    }

    fn append_span(&mut self, kind: SpanKind, length: usize) {
        trace!("Queued {length} units of {kind:?}");

        if self.spans.append(kind, length) {
            self.host.input_event.set_signaled();
        }

        self.wake_up_readers_waiting_for_data();
    }

    pub fn wake_up_readers_waiting_for_data(&self) {
        self.host
            .waiters
            .notify_all(false, WaitTerminationReason::NoReason);
    }

    /// Wake every blocked reader and tell it to give up.
    pub fn terminate_read(&self, reason: WaitTerminationReason) {
        debug!("Terminating pending reads: {reason}");
        self.host.waiters.notify_all(true, reason);
    }

    // ────────────────────────────────────────────────────────────────
    // READING
    // ────────────────────────────────────────────────────────────────

    /// Move queued input into `dest` as records, in write order. Text is
    /// handed out as one key-down record per UTF-16 unit.
    pub fn read_records(&mut self, dest: &mut [InputRecord]) -> usize {
        let mut filled = 0;

        while filled < dest.len() {
            let Some(span) = self.spans.front_mut() else {
                break;
            };

            let consumed = match span.kind {
                SpanKind::Record => {
                    let count = span.length.min(dest.len() - filled);
                    let read = self.records.read_into(&mut dest[filled..filled + count]);
                    filled += read;
                    read
                }
                SpanKind::Text => {
                    let mut read = 0;
                    while filled < dest.len() && read < span.length {
                        let Some(unit) = self.text.read() else {
                            break;
                        };
                        dest[filled] = text_key_record(unit);
                        filled += 1;
                        read += 1;
                    }
                    read
                }
            };

            span.length -= consumed;
            if span.length == 0 {
                self.spans.pop_front();
            } else if consumed == 0 {
                error!("Span index is ahead of its queue: {span:?}");
                break;
            }
        }

        filled
    }

    /// Move queued input into `dest` as UTF-16, in write order. Records are
    /// consumed as they are passed over; only key-down records with a
    /// character produce output.
    pub fn read_wide_text(&mut self, dest: &mut [u16]) -> usize {
        let mut filled = 0;

        while filled < dest.len() {
            let Some(span) = self.spans.front_mut() else {
                break;
            };

            let consumed = match span.kind {
                SpanKind::Text => {
                    let count = span.length.min(dest.len() - filled);
                    let read = self.text.read_into(&mut dest[filled..filled + count]);
                    filled += read;
                    read
                }
                SpanKind::Record => {
                    let mut read = 0;
                    while filled < dest.len() && read < span.length {
                        let Some(record) = self.records.read() else {
                            break;
                        };
                        if let Some(unit) = record.decoded_char() {
                            dest[filled] = unit;
                            filled += 1;
                        }
                        read += 1;
                    }
                    read
                }
            };

            span.length -= consumed;
            if span.length == 0 {
                self.spans.pop_front();
            } else if consumed == 0 {
                error!("Span index is ahead of its queue: {span:?}");
                break;
            }
        }

        filled
    }

    /// Like [`Self::read_records`], but leaves the queue untouched.
    pub fn peek_records(&self, dest: &mut [InputRecord]) -> usize {
        let mut text = self.text.iter();
        let mut records = self.records.iter();
        let mut filled = 0;

        'spans: for span in self.spans.iter() {
            for _ in 0..span.length {
                if filled == dest.len() {
                    break 'spans;
                }

                let next = match span.kind {
                    SpanKind::Record => records.next().copied(),
                    SpanKind::Text => text.next().map(|&unit| text_key_record(unit)),
                };
                let Some(record) = next else {
                    break 'spans;
                };

                dest[filled] = record;
                filled += 1;
            }
        }

        filled
    }

    /// Number of records an event read could return right now. Each queued
    /// text unit counts as one record.
    #[must_use]
    pub fn number_of_ready_events(&self) -> usize {
        self.cached_input_events.len() + self.records.len() + self.text.len()
    }

    /// Whether a text read of the given width would find anything.
    #[must_use]
    pub fn has_text_available(&self, wide: bool) -> bool {
        let cached = match self.reading_mode {
            ReadingMode::WideText if wide => !self.cached_text_wide.is_empty(),
            ReadingMode::NarrowText if !wide => {
                !self.cached_text_narrow.is_empty() || !self.cached_text_wide.is_empty()
            }
            _ => false,
        };

        cached || !self.spans.is_empty()
    }

    /// Whether an event read would find anything.
    #[must_use]
    pub fn has_events_available(&self) -> bool {
        !self.cached_input_events.is_empty() || !self.spans.is_empty()
    }

    /// Discard everything queued and reset the ready signal. The conversion
    /// caches and the partial byte register are left alone.
    pub fn flush(&mut self) {
        debug!(
            "Flushing {} text units and {} records",
            self.text.len(),
            self.records.len()
        );

        self.spans.clear();
        self.records.clear();
        self.text.clear();
        self.host.input_event.reset_signaled();
    }

    /// Does nothing. Queued key records are never filtered out.
    pub fn flush_all_but_keys(&mut self) {
        trace!("flush_all_but_keys leaves the queue untouched");
    }

    // ────────────────────────────────────────────────────────────────
    // PARTIAL BYTE REGISTER
    // ────────────────────────────────────────────────────────────────

    pub fn store_write_partial_byte_sequence(&mut self, record: InputRecord) {
        self.write_partial_byte_sequence = Some(record);
    }

    #[must_use]
    pub const fn is_write_partial_byte_sequence_available(&self) -> bool {
        self.write_partial_byte_sequence.is_some()
    }

    pub fn fetch_write_partial_byte_sequence(&mut self) -> Option<InputRecord> {
        self.write_partial_byte_sequence.take()
    }
}

/// Bytes and character of a widened narrow key-down.
#[derive(Debug, Clone, Copy)]
struct WidenedKey {
    lead: Option<u8>,
    trail: u8,
    unicode_char: u16,
}

impl WidenedKey {
    fn releases(self, byte: u8) -> bool {
        self.trail == byte || self.lead == Some(byte)
    }
}

/// The key-down record a text unit reads as.
const fn text_key_record(unit: u16) -> InputRecord {
    InputRecord::synthesize_key_event(true, 1, 0, 0, unit, ControlKeyState::empty())
}

/// A narrow key record carries its code page byte in the low byte.
const fn narrow_byte(key: &KeyEvent) -> u8 {
    key.unicode_char.to_le_bytes()[0]
}

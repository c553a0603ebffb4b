// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Feeding lines of input into a session and printing what reads return.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use conin_common::{args::Args, control_keys::ControlKeyState, input_record::InputRecord};
use conin_input::{
    consume::TextBuffer, encoding, error::InputBufferError, input_buffer::InputBuffer,
    reading_mode::ReadingMode, session::BlockingReader, session::ConsoleSession,
};

const REPLACEMENT_CHARACTER: &str = "\u{FFFD}";

#[must_use]
pub const fn reading_mode(args: &Args) -> ReadingMode {
    if args.events {
        ReadingMode::events(!args.narrow)
    } else {
        ReadingMode::text(!args.narrow)
    }
}

/// A key-down and a key-up record for every unit.
#[must_use]
pub fn key_records(units: &[u16]) -> Vec<InputRecord> {
    units
        .iter()
        .flat_map(|&unit| {
            [true, false].map(|key_down| {
                InputRecord::synthesize_key_event(key_down, 1, 0, 0, unit, ControlKeyState::empty())
            })
        })
        .collect()
}

/// Queue one line of code page text, as text or as key records.
pub fn queue_line(buffer: &mut InputBuffer, line: &[u8], as_keys: bool) {
    if !as_keys {
        buffer.write_narrow_text(line);
        return;
    }

    match encoding::decode_to_utf16(buffer.code_page(), line) {
        Ok(units) => buffer.write_events(&key_records(&units)),
        Err(e) => error!("Failed to decode input line: {e}"),
    }
}

/// Queue every line of `input` into `session`. Returns the number of lines.
///
/// # Errors
/// Returns an error if reading `input` fails.
pub fn feed<R: BufRead>(session: &ConsoleSession, mut input: R, as_keys: bool) -> Result<usize> {
    let mut line = Vec::new();
    let mut lines = 0;

    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .context("failed to read input")?;
        if read == 0 {
            break;
        }

        session.with_buffer(|buffer| queue_line(buffer, &line, as_keys));
        lines += 1;
    }

    debug!("Fed {lines} lines");
    Ok(lines)
}

/// Something reads can be made against: a blocking reader, or the buffer
/// itself when draining.
pub trait ReadSource {
    /// # Errors
    /// Whatever the underlying read reports.
    fn next_text(&mut self, target: &mut TextBuffer<'_>) -> Result<usize, InputBufferError>;

    /// # Errors
    /// Whatever the underlying read reports.
    fn next_events(
        &mut self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError>;
}

impl ReadSource for BlockingReader<'_> {
    fn next_text(&mut self, target: &mut TextBuffer<'_>) -> Result<usize, InputBufferError> {
        self.read_text(target)
    }

    fn next_events(
        &mut self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError> {
        self.read_events(wide, dest)
    }
}

impl ReadSource for InputBuffer {
    fn next_text(&mut self, target: &mut TextBuffer<'_>) -> Result<usize, InputBufferError> {
        self.read_text(target)
    }

    fn next_events(
        &mut self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError> {
        self.read_events(wide, dest)
    }
}

/// What one read returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    Wide(Vec<u16>),
    Narrow(Vec<u8>),
    Events(Vec<InputRecord>),
}

impl Batch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Wide(units) => units.is_empty(),
            Self::Narrow(bytes) => bytes.is_empty(),
            Self::Events(records) => records.is_empty(),
        }
    }
}

/// Read up to `capacity` units in the shape `mode` asks for.
///
/// # Errors
/// Whatever the read reports.
pub fn read_batch<S: ReadSource + ?Sized>(
    source: &mut S,
    mode: ReadingMode,
    capacity: usize,
) -> Result<Batch, InputBufferError> {
    match mode {
        ReadingMode::WideText => {
            let mut units = vec![0u16; capacity];
            let read = source.next_text(&mut TextBuffer::Wide(&mut units))?;
            units.truncate(read);
            Ok(Batch::Wide(units))
        }
        ReadingMode::NarrowText => {
            let mut bytes = vec![0u8; capacity];
            let read = source.next_text(&mut TextBuffer::Narrow(&mut bytes))?;
            bytes.truncate(read);
            Ok(Batch::Narrow(bytes))
        }
        ReadingMode::WideEvents | ReadingMode::NarrowEvents => {
            let mut records = vec![InputRecord::default(); capacity];
            let read = source.next_events(mode.is_wide(), &mut records)?;
            records.truncate(read);
            Ok(Batch::Events(records))
        }
    }
}

/// Writes batches out: text as is, records one per line.
#[derive(Debug)]
pub struct Printer<W> {
    out: W,
    /// High surrogate that ended the previous wide batch.
    pending_high_surrogate: Option<u16>,
}

impl<W: Write> Printer<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out,
            pending_high_surrogate: None,
        }
    }

    /// # Errors
    /// Returns an error if writing fails.
    pub fn print(&mut self, batch: &Batch) -> io::Result<()> {
        match batch {
            Batch::Narrow(bytes) => self.out.write_all(bytes)?,
            Batch::Wide(units) => self.print_wide(units)?,
            Batch::Events(records) => {
                for record in records {
                    writeln!(self.out, "{record}")?;
                }
            }
        }

        self.out.flush()
    }

    fn print_wide(&mut self, units: &[u16]) -> io::Result<()> {
        let mut text: Vec<u16> = self.pending_high_surrogate.take().into_iter().collect();
        text.extend_from_slice(units);

        // a pair split across reads is finished by the next batch
        if let Some(&last) = text.last() {
            if (0xD800..=0xDBFF).contains(&last) {
                self.pending_high_surrogate = text.pop();
            }
        }

        self.out
            .write_all(String::from_utf16_lossy(&text).as_bytes())
    }

    /// Flush whatever is still held back.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.pending_high_surrogate.take().is_some() {
            self.out.write_all(REPLACEMENT_CHARACTER.as_bytes())?;
        }

        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use conin_common::input_mode::InputMode;
    use conin_input::host::HostServices;
    use test_log::test;

    use super::*;

    fn drain(buffer: &mut InputBuffer, mode: ReadingMode, capacity: usize) -> Vec<Batch> {
        let mut batches = Vec::new();
        loop {
            let batch = read_batch(buffer, mode, capacity).unwrap();
            if batch.is_empty() {
                return batches;
            }
            batches.push(batch);
        }
    }

    #[test]
    fn modes_follow_flags() {
        let mut args = Args::default();
        assert_eq!(reading_mode(&args), ReadingMode::WideText);
        args.narrow = true;
        assert_eq!(reading_mode(&args), ReadingMode::NarrowText);
        args.events = true;
        assert_eq!(reading_mode(&args), ReadingMode::NarrowEvents);
    }

    #[test]
    fn key_records_come_in_pairs() {
        let records = key_records(&[0x61]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].decoded_char(), Some(0x61));
        assert_eq!(records[1].decoded_char(), None);
    }

    #[test]
    fn fed_lines_read_back_as_text() {
        let session = ConsoleSession::new(65001, InputMode::default());
        let lines = feed(&session, Cursor::new("one\ntwo\n"), false).unwrap();
        assert_eq!(lines, 2);

        let batches = session.with_buffer(|buf| drain(buf, ReadingMode::NarrowText, 5));
        let bytes: Vec<u8> = batches
            .iter()
            .flat_map(|batch| match batch {
                Batch::Narrow(bytes) => bytes.clone(),
                other => panic!("unexpected batch {other:?}"),
            })
            .collect();
        assert_eq!(bytes, b"one\ntwo\n");
    }

    #[test]
    fn keys_read_back_as_text_without_key_ups() {
        let mut buffer = InputBuffer::new(HostServices::detached(65001));
        queue_line(&mut buffer, "h\u{e9}".as_bytes(), true);
        assert_eq!(buffer.number_of_ready_events(), 4);

        let batches = drain(&mut buffer, ReadingMode::WideText, 8);
        assert_eq!(batches, vec![Batch::Wide(vec![0x68, 0xE9])]);
    }

    #[test]
    fn narrow_event_batches_expand_bytes() {
        let mut buffer = InputBuffer::new(HostServices::detached(65001));
        queue_line(&mut buffer, "\u{e9}".as_bytes(), false);

        let batches = drain(&mut buffer, ReadingMode::NarrowEvents, 1);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn printer_joins_split_surrogate_pairs() {
        let units: Vec<u16> = "\u{1F600}".encode_utf16().collect();
        let mut out = Vec::new();

        let mut printer = Printer::new(&mut out);
        printer.print(&Batch::Wide(vec![0x61, units[0]])).unwrap();
        printer.print(&Batch::Wide(vec![units[1]])).unwrap();
        printer.finish().unwrap();

        assert_eq!(out, "a\u{1F600}".as_bytes());
    }

    #[test]
    fn printer_replaces_dangling_high_surrogate() {
        let mut out = Vec::new();

        let mut printer = Printer::new(&mut out);
        printer.print(&Batch::Wide(vec![0xD83D])).unwrap();
        printer.finish().unwrap();

        assert_eq!(out, REPLACEMENT_CHARACTER.as_bytes());
    }

    #[test]
    fn printer_writes_one_record_per_line() {
        let mut out = Vec::new();

        Printer::new(&mut out)
            .print(&Batch::Events(vec![
                InputRecord::Menu(7),
                InputRecord::Focus(false),
            ]))
            .unwrap();

        assert_eq!(out, b"Menu(7)\nFocus(false)\n");
    }
}

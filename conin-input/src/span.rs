// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use conin_buffer::ring_buffer::RingBuffer;

/// Which queue a [`Span`] draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanKind {
    #[default]
    Record,
    Text,
}

/// A run of consecutive writes of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub kind: SpanKind,
    /// Number of records or UTF-16 units, depending on `kind`.
    pub length: usize,
}

/// Arrival order across the text and record queues.
///
/// Adjacent spans always differ in kind, and the lengths per kind add up to
/// the number of elements in the matching queue.
#[derive(Debug, Default)]
pub struct SpanIndex {
    spans: RingBuffer<Span>,
}

impl SpanIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Record `length` more elements of `kind`, extending the newest span
    /// when it has the same kind. Returns whether the index was empty
    /// beforehand.
    pub fn append(&mut self, kind: SpanKind, length: usize) -> bool {
        debug_assert!(length > 0, "empty spans are never recorded");

        let initially_empty = self.spans.is_empty();
        if let Some(last) = self.spans.last_written_mut() {
            if last.kind == kind {
                last.length += length;
                return initially_empty;
            }
        }

        self.spans.write(Span { kind, length });
        initially_empty
    }

    #[must_use]
    pub fn front(&self) -> Option<&Span> {
        self.spans.peek()
    }

    pub fn front_mut(&mut self) -> Option<&mut Span> {
        self.spans.peek_mut()
    }

    pub fn pop_front(&mut self) -> Option<Span> {
        self.spans.read()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> + '_ {
        self.spans.iter()
    }

    /// Total length of every span of `kind`.
    #[must_use]
    pub fn total(&self, kind: SpanKind) -> usize {
        self.iter()
            .filter(|span| span.kind == kind)
            .map(|span| span.length)
            .sum()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }
}

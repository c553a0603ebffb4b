// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// The kind of read that produced the current caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingMode {
    #[default]
    WideText,
    NarrowText,
    WideEvents,
    NarrowEvents,
}

impl ReadingMode {
    #[must_use]
    pub const fn text(wide: bool) -> Self {
        if wide {
            Self::WideText
        } else {
            Self::NarrowText
        }
    }

    #[must_use]
    pub const fn events(wide: bool) -> Self {
        if wide {
            Self::WideEvents
        } else {
            Self::NarrowEvents
        }
    }

    #[must_use]
    pub const fn is_wide(self) -> bool {
        matches!(self, Self::WideText | Self::WideEvents)
    }
}

/// Converted text a previous read produced but could not hand out.
///
/// `offset` marks how much of `data` has already been delivered. Once all of
/// it is delivered the storage is released.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextCache<T> {
    data: Vec<T>,
    offset: usize,
}

impl<T: Copy> TextCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            offset: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.data.get(self.offset..).unwrap_or_default()
    }

    /// Replace the contents with `items`.
    pub fn replace(&mut self, items: &[T]) {
        self.data.clear();
        self.data.extend_from_slice(items);
        self.offset = 0;
    }

    /// Add `items` after whatever has not been delivered yet.
    pub fn append(&mut self, items: &[T]) {
        if self.is_empty() {
            self.replace(items);
        } else {
            self.data.extend_from_slice(items);
        }
    }

    /// Mark `count` more elements as delivered.
    pub fn advance(&mut self, count: usize) {
        self.offset = self.offset.saturating_add(count);
        if self.is_empty() {
            self.release();
        }
    }

    pub fn release(&mut self) {
        self.data = Vec::new();
        self.offset = 0;
    }

    /// Remove and return everything not yet delivered.
    pub fn take(&mut self) -> Vec<T> {
        let rest = self.as_slice().to_vec();
        self.release();
        rest
    }
}

// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

const MIN_CAPACITY: usize = 16;

/// Growable circular buffer of plain `Copy` values.
///
/// Elements are written at `writer` and consumed at `reader`; both wrap to
/// the start of the backing array when they reach its end. A write that does
/// not fit reallocates to `max(16, new_size, capacity * 1.5)` and lays the
/// live elements out from index 0. Reads never shrink the allocation.
///
/// The buffer has no locking of its own; callers serialize access.
#[derive(Debug)]
pub struct RingBuffer<T> {
    /// Backing storage. Its length is the capacity.
    data: Box<[T]>,

    /// Index of the next element to read.
    reader: usize,

    /// Index the next write lands on.
    writer: usize,

    /// Number of live elements, `0 <= size <= data.len()`.
    size: usize,
}

impl<T: Copy + Default> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Creates an empty buffer. Nothing is allocated until the first write.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Box::default(),
            reader: 0,
            writer: 0,
            size: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Logically discards every element. The allocation is kept.
    pub fn clear(&mut self) {
        self.reader = 0;
        self.writer = 0;
        self.size = 0;
    }

    pub fn write(&mut self, item: T) {
        let new_size = self.size + 1;
        if new_size > self.capacity() {
            self.grow(new_size);
        }

        self.data[self.writer] = item;
        self.writer += 1;
        if self.writer == self.capacity() {
            self.writer = 0;
        }

        self.size = new_size;
    }

    pub fn write_slice(&mut self, items: &[T]) {
        if items.is_empty() {
            return;
        }

        let new_size = self.size + items.len();
        if new_size > self.capacity() {
            self.grow(new_size);
        }

        let available = self.capacity() - self.writer;
        if available > items.len() {
            self.data[self.writer..self.writer + items.len()].copy_from_slice(items);
            self.writer += items.len();
        } else {
            let (tail, head) = items.split_at(available);
            self.data[self.writer..].copy_from_slice(tail);
            self.data[..head.len()].copy_from_slice(head);
            self.writer = head.len();
        }

        self.size = new_size;
    }

    /// The most recently written element, for in-place updates.
    pub fn last_written_mut(&mut self) -> Option<&mut T> {
        if self.size == 0 {
            return None;
        }

        let index = if self.writer == 0 {
            self.capacity() - 1
        } else {
            self.writer - 1
        };
        Some(&mut self.data[index])
    }

    /// The next element to be read, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        if self.size == 0 {
            return None;
        }

        Some(&self.data[self.reader])
    }

    pub fn peek_mut(&mut self) -> Option<&mut T> {
        if self.size == 0 {
            return None;
        }

        Some(&mut self.data[self.reader])
    }

    pub fn read(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }

        let item = self.data[self.reader];
        self.reader += 1;
        if self.reader == self.capacity() {
            self.reader = 0;
        }

        self.size -= 1;
        Some(item)
    }

    /// Moves up to `dest.len()` elements into `dest` and returns how many
    /// were copied.
    pub fn read_into(&mut self, dest: &mut [T]) -> usize {
        let count = self.size.min(dest.len());
        if count == 0 {
            return 0;
        }

        let available = self.capacity() - self.reader;
        if available > count {
            dest[..count].copy_from_slice(&self.data[self.reader..self.reader + count]);
            self.reader += count;
        } else {
            let remaining = count - available;
            dest[..available].copy_from_slice(&self.data[self.reader..]);
            dest[available..count].copy_from_slice(&self.data[..remaining]);
            self.reader = remaining;
        }

        self.size -= count;
        count
    }

    /// Drops up to `count` elements without copying them and returns how many
    /// were dropped.
    pub fn advance(&mut self, count: usize) -> usize {
        let count = self.size.min(count);
        if count == 0 {
            return 0;
        }

        let available = self.capacity() - self.reader;
        if available > count {
            self.reader += count;
        } else {
            self.reader = count - available;
        }

        self.size -= count;
        count
    }

    /// The live elements in read order, as up to two contiguous slices.
    #[must_use]
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.size == 0 {
            return (&[], &[]);
        }

        let end = self.reader + self.size;
        if end <= self.capacity() {
            (&self.data[self.reader..end], &[])
        } else {
            (&self.data[self.reader..], &self.data[..self.writer])
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (first, second) = self.as_slices();
        first.iter().chain(second.iter())
    }

    fn grow(&mut self, new_size: usize) {
        let capacity = self.capacity();
        let new_capacity = MIN_CAPACITY.max(new_size.max(capacity + capacity / 2));

        trace!("Growing ring buffer from {capacity} to {new_capacity}");

        let mut data = vec![T::default(); new_capacity].into_boxed_slice();
        let (first, second) = self.as_slices();
        data[..first.len()].copy_from_slice(first);
        data[first.len()..self.size].copy_from_slice(second);

        self.data = data;
        self.reader = 0;
        self.writer = self.size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buf: &mut RingBuffer<u32>) -> Vec<u32> {
        let mut out = vec![0; buf.len()];
        let n = buf.read_into(&mut out);
        out.truncate(n);
        out
    }

    // ────────────────────────────────────────────────────────────────
    // ALLOCATION
    // ────────────────────────────────────────────────────────────────

    #[test]
    fn new_buffer_does_not_allocate() {
        let buf = RingBuffer::<u32>::new();
        assert_eq!(buf.capacity(), 0);
        assert!(buf.is_empty());
        assert_eq!(buf.peek(), None);
    }

    #[test]
    fn first_write_allocates_minimum_capacity() {
        let mut buf = RingBuffer::new();
        buf.write(1u32);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn growth_is_one_and_a_half_times() {
        let mut buf = RingBuffer::new();
        for i in 0..17u32 {
            buf.write(i);
        }
        assert_eq!(buf.capacity(), 24);

        for i in 17..25u32 {
            buf.write(i);
        }
        assert_eq!(buf.capacity(), 36);
    }

    #[test]
    fn bulk_write_larger_than_growth_step_uses_exact_size() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&[0u32; 10]);
        buf.write_slice(&[1u32; 100]);
        assert_eq!(buf.capacity(), 110);
        assert_eq!(buf.len(), 110);
    }

    #[test]
    fn growth_unwraps_live_elements() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&(0..16u32).collect::<Vec<_>>());
        assert_eq!(buf.advance(10), 10);

        // wraps: writer goes back to the start of the array
        buf.write_slice(&[16, 17, 18]);
        assert_eq!(buf.writer, 3);

        // forces a reallocation while the contents are split
        buf.write_slice(&(19..40u32).collect::<Vec<_>>());
        assert_eq!(buf.reader, 0);
        assert_eq!(drain(&mut buf), (10..40u32).collect::<Vec<_>>());
    }

    #[test]
    fn clear_keeps_allocation() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&[1u32, 2, 3]);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.read(), None);
    }

    // ────────────────────────────────────────────────────────────────
    // CURSORS
    // ────────────────────────────────────────────────────────────────

    #[test]
    fn exact_fit_write_wraps_writer() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&[0u32; 16]);
        assert_eq!(buf.writer, 0);
        assert_eq!(buf.len(), 16);
        assert_eq!(buf.last_written_mut().copied(), Some(0));
    }

    #[test]
    fn last_written_tracks_wrapped_writer() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&(0..16u32).collect::<Vec<_>>());
        buf.advance(4);
        buf.write(99);

        let last = buf.last_written_mut().unwrap();
        assert_eq!(*last, 99);
        *last = 100;

        let (first, second) = buf.as_slices();
        assert_eq!(first.len(), 12);
        assert_eq!(second, &[100]);
    }

    #[test]
    fn last_written_empty_is_none() {
        let mut buf = RingBuffer::<u32>::new();
        assert!(buf.last_written_mut().is_none());
        buf.write(1);
        buf.read();
        assert!(buf.last_written_mut().is_none());
    }

    #[test]
    fn read_into_is_clamped() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&[1u32, 2]);
        let mut out = [0u32; 5];
        assert_eq!(buf.read_into(&mut out), 2);
        assert_eq!(out, [1, 2, 0, 0, 0]);
        assert_eq!(buf.read_into(&mut out), 0);
    }

    #[test]
    fn advance_is_clamped() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&[1u32, 2, 3]);
        assert_eq!(buf.advance(10), 3);
        assert!(buf.is_empty());
        assert_eq!(buf.advance(1), 0);
    }

    #[test]
    fn peek_mut_updates_front() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&[1u32, 2]);
        *buf.peek_mut().unwrap() = 5;
        assert_eq!(buf.read(), Some(5));
        assert_eq!(buf.peek(), Some(&2));
    }

    #[test]
    fn iter_does_not_consume() {
        let mut buf = RingBuffer::new();
        buf.write_slice(&(0..16u32).collect::<Vec<_>>());
        buf.advance(14);
        buf.write_slice(&[16, 17]);

        let seen: Vec<u32> = buf.iter().copied().collect();
        assert_eq!(seen, vec![14, 15, 16, 17]);
        assert_eq!(buf.len(), 4);
    }
}

// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use conin_common::{config::InputConfig, input_mode::InputMode, input_record::InputRecord};
use parking_lot::Mutex;

use crate::{
    consume::TextBuffer,
    error::InputBufferError,
    host::{CondvarWaitQueue, FixedCodePage, HostServices, InputReadyEvent, WaitTerminationReason},
    input_buffer::InputBuffer,
};

/// An input buffer shared between writer and reader threads.
///
/// Every operation runs under one lock. Blocking reads wait on the buffer's
/// condition variable with that lock released and re-check for input each
/// time they wake.
#[derive(Debug)]
pub struct ConsoleSession {
    buffer: Mutex<InputBuffer>,
    waiters: Arc<CondvarWaitQueue>,
    input_event: Arc<InputReadyEvent>,
    code_page: Arc<FixedCodePage>,
}

impl ConsoleSession {
    #[must_use]
    pub fn new(code_page: u32, input_mode: InputMode) -> Self {
        let waiters = Arc::new(CondvarWaitQueue::default());
        let input_event = Arc::new(InputReadyEvent::default());
        let code_page = Arc::new(FixedCodePage::new(code_page));

        let host = HostServices {
            waiters: waiters.clone(),
            input_event: input_event.clone(),
            code_page: code_page.clone(),
        };

        Self {
            buffer: Mutex::new(InputBuffer::with_input_mode(host, input_mode)),
            waiters,
            input_event,
            code_page,
        }
    }

    #[must_use]
    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.code_page, config.input_mode())
    }

    /// Run `f` with exclusive access to the buffer.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&mut InputBuffer) -> R) -> R {
        f(&mut self.buffer.lock())
    }

    /// Whether the "input available" event is set.
    #[must_use]
    pub fn is_input_available(&self) -> bool {
        self.input_event.is_signaled()
    }

    pub fn set_code_page(&self, code_page: u32) {
        debug!("Session code page set to {code_page}");
        self.code_page.set(code_page);
    }

    pub fn terminate_read(&self, reason: WaitTerminationReason) {
        self.buffer.lock().terminate_read(reason);
    }

    /// A reader that gives up on every termination from now on, including
    /// ones that happen while it is not waiting.
    #[must_use]
    pub fn reader(&self) -> BlockingReader<'_> {
        BlockingReader {
            session: self,
            ticket: self.waiters.termination_ticket(),
        }
    }

    /// Read text into `target`, waiting until at least one unit is written.
    ///
    /// # Errors
    /// [`InputBufferError::ReadTerminated`] when the read is terminated while
    /// waiting, or a conversion error for narrow targets.
    pub fn read_text_blocking(
        &self,
        target: &mut TextBuffer<'_>,
    ) -> Result<usize, InputBufferError> {
        self.reader().read_text(target)
    }

    /// Read records into `dest`, waiting until at least one is written.
    ///
    /// # Errors
    /// [`InputBufferError::ReadTerminated`] when the read is terminated while
    /// waiting, or a conversion error for narrow reads.
    pub fn read_events_blocking(
        &self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError> {
        self.reader().read_events(wide, dest)
    }
}

/// Blocking reads against a [`ConsoleSession`], tied to the terminations
/// seen when the reader was created.
#[derive(Debug)]
pub struct BlockingReader<'a> {
    session: &'a ConsoleSession,
    ticket: u64,
}

impl BlockingReader<'_> {
    /// # Errors
    /// [`InputBufferError::ReadTerminated`] once the session has been
    /// terminated, or a conversion error for narrow targets.
    pub fn read_text(&self, target: &mut TextBuffer<'_>) -> Result<usize, InputBufferError> {
        if target.is_empty() {
            return Ok(0);
        }

        let wide = target.is_wide();
        self.read(
            |buffer| buffer.has_text_available(wide),
            |buffer| buffer.read_text(target),
        )
    }

    /// # Errors
    /// [`InputBufferError::ReadTerminated`] once the session has been
    /// terminated, or a conversion error for narrow reads.
    pub fn read_events(
        &self,
        wide: bool,
        dest: &mut [InputRecord],
    ) -> Result<usize, InputBufferError> {
        if dest.is_empty() {
            return Ok(0);
        }

        self.read(InputBuffer::has_events_available, |buffer| {
            buffer.read_events(wide, dest)
        })
    }

    fn read(
        &self,
        available: impl Fn(&InputBuffer) -> bool,
        mut read: impl FnMut(&mut InputBuffer) -> Result<usize, InputBufferError>,
    ) -> Result<usize, InputBufferError> {
        let waiters = &self.session.waiters;
        let mut guard = self.session.buffer.lock();

        loop {
            if let Some(reason) = waiters.terminated_since(self.ticket) {
                debug!("Blocked read terminated: {reason}");
                return Err(InputBufferError::ReadTerminated(reason));
            }

            if available(&guard) {
                let count = read(&mut guard)?;
                if count > 0 {
                    return Ok(count);
                }
            }

            trace!("Waiting for input");
            waiters.wait(&mut guard);
        }
    }
}

// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Services the input buffer consumes from the console host.
//!
//! The buffer never reaches for process-wide state. Whoever creates it hands
//! in a [`HostServices`] bundle: the queue of blocked readers, the
//! level-triggered "input available" event, and the active code page.

use core::fmt;
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Why blocked readers are being woken without data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitTerminationReason {
    #[default]
    NoReason,
    CtrlC,
    CtrlBreak,
    ThreadDying,
    HandleClosing,
}

impl fmt::Display for WaitTerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReason => write!(f, "no reason"),
            Self::CtrlC => write!(f, "ctrl-c"),
            Self::CtrlBreak => write!(f, "ctrl-break"),
            Self::ThreadDying => write!(f, "thread dying"),
            Self::HandleClosing => write!(f, "handle closing"),
        }
    }
}

/// Readers blocked until input arrives.
pub trait WaitQueue: Send + Sync {
    /// Wake every blocked reader. Readers re-check for data themselves, so a
    /// wake without data is harmless. `terminating` asks them to give up
    /// instead of waiting again.
    fn notify_all(&self, terminating: bool, reason: WaitTerminationReason);
}

/// Level-triggered event mirroring whether the buffer holds input.
pub trait ReadySignal: Send + Sync {
    fn set_signaled(&self);
    fn reset_signaled(&self);
}

pub trait CodePageProvider: Send + Sync {
    fn current_code_page(&self) -> u32;
}

#[derive(Clone)]
pub struct HostServices {
    pub waiters: Arc<dyn WaitQueue>,
    pub input_event: Arc<dyn ReadySignal>,
    pub code_page: Arc<dyn CodePageProvider>,
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("code_page", &self.code_page.current_code_page())
            .finish_non_exhaustive()
    }
}

impl HostServices {
    /// Services for a buffer nobody blocks on: notifications go nowhere and
    /// the code page is fixed.
    #[must_use]
    pub fn detached(code_page: u32) -> Self {
        Self {
            waiters: Arc::new(NoWaiters),
            input_event: Arc::new(InputReadyEvent::default()),
            code_page: Arc::new(FixedCodePage::new(code_page)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoWaiters;

impl WaitQueue for NoWaiters {
    fn notify_all(&self, _terminating: bool, _reason: WaitTerminationReason) {}
}

#[derive(Debug, Default)]
pub struct InputReadyEvent {
    signaled: AtomicBool,
}

impl InputReadyEvent {
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

impl ReadySignal for InputReadyEvent {
    fn set_signaled(&self) {
        self.signaled.store(true, Ordering::Release);
    }

    fn reset_signaled(&self) {
        self.signaled.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct FixedCodePage {
    code_page: AtomicU32,
}

impl FixedCodePage {
    #[must_use]
    pub const fn new(code_page: u32) -> Self {
        Self {
            code_page: AtomicU32::new(code_page),
        }
    }

    pub fn set(&self, code_page: u32) {
        self.code_page.store(code_page, Ordering::Release);
    }
}

impl CodePageProvider for FixedCodePage {
    fn current_code_page(&self) -> u32 {
        self.code_page.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TerminationState {
    generation: u64,
    reason: WaitTerminationReason,
}

/// Wait queue backed by a condition variable.
///
/// Readers wait on the same mutex guard that protects the input buffer, so
/// a write (done under that lock) can never slip between a reader's
/// availability check and its wait. Terminations bump a generation counter:
/// a reader takes a ticket before it waits and only abandons the read for
/// terminations newer than its ticket.
#[derive(Debug, Default)]
pub struct CondvarWaitQueue {
    condvar: Condvar,
    termination: Mutex<TerminationState>,
}

impl CondvarWaitQueue {
    #[must_use]
    pub fn termination_ticket(&self) -> u64 {
        self.termination.lock().generation
    }

    #[must_use]
    pub fn terminated_since(&self, ticket: u64) -> Option<WaitTerminationReason> {
        let state = self.termination.lock();
        (state.generation != ticket).then_some(state.reason)
    }

    /// Release `guard`, block until notified, and re-acquire it.
    pub fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.condvar.wait(guard);
    }
}

impl WaitQueue for CondvarWaitQueue {
    fn notify_all(&self, terminating: bool, reason: WaitTerminationReason) {
        if terminating {
            let mut state = self.termination.lock();
            state.generation = state.generation.wrapping_add(1);
            state.reason = reason;
        }

        self.condvar.notify_all();
    }
}

//! Fair counting semaphore gating pool capacity.
//!
//! Waiters are served strictly in arrival order: a permit released while
//! others are queued goes to the head of the queue, never to a newcomer.
//! Unlike `tokio::sync::Semaphore` the wait is a blocking `Condvar` wait, and
//! the number of free permits can be read at any time so the pool can check
//! its bookkeeping against it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Outcome of a timed permit acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A permit was taken and must later be released.
    Acquired,
    /// The deadline passed first; no permit was taken.
    TimedOut,
    /// The semaphore was closed; no permit was taken.
    Closed,
}

struct SemaphoreState {
    permits: usize,
    /// Tickets of blocked callers, oldest first.
    waiters: VecDeque<u64>,
    next_ticket: u64,
    closed: bool,
}

impl SemaphoreState {
    fn is_next(&self, ticket: u64) -> bool {
        self.permits > 0 && self.waiters.front() == Some(&ticket)
    }

    fn leave(&mut self, ticket: u64) {
        if let Some(pos) = self.waiters.iter().position(|t| *t == ticket) {
            self.waiters.remove(pos);
        }
    }
}

/// FIFO counting semaphore with an introspectable permit count.
pub struct FairSemaphore {
    state: Mutex<SemaphoreState>,
    condvar: Condvar,
}

impl FairSemaphore {
    /// Create a semaphore holding `permits` permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(SemaphoreState {
                permits,
                waiters: VecDeque::new(),
                next_ticket: 0,
                closed: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Take a permit, blocking for at most `timeout`.
    ///
    /// A caller that times out or observes closure leaves the queue without
    /// consuming anything.
    pub fn try_acquire_for(&self, timeout: Duration) -> Acquire {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        if state.closed {
            return Acquire::Closed;
        }
        // Fast path: nobody queued ahead of us.
        if state.waiters.is_empty() && state.permits > 0 {
            state.permits -= 1;
            return Acquire::Acquired;
        }

        let ticket = state.next_ticket;
        state.next_ticket = state.next_ticket.wrapping_add(1);
        state.waiters.push_back(ticket);

        let mut timed_out = false;
        loop {
            if state.closed {
                state.leave(ticket);
                return Acquire::Closed;
            }
            if state.is_next(ticket) {
                state.waiters.pop_front();
                state.permits -= 1;
                if state.permits > 0 && !state.waiters.is_empty() {
                    // Let the new head see the remaining permits.
                    self.condvar.notify_all();
                }
                return Acquire::Acquired;
            }
            if timed_out {
                state.leave(ticket);
                if state.permits > 0 && !state.waiters.is_empty() {
                    self.condvar.notify_all();
                }
                return Acquire::TimedOut;
            }
            timed_out = match deadline {
                Some(deadline) => self.condvar.wait_until(&mut state, deadline).timed_out(),
                None => {
                    self.condvar.wait(&mut state);
                    false
                }
            };
        }
    }

    /// Take a permit only if one is free and nobody is queued.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed || !state.waiters.is_empty() || state.permits == 0 {
            return false;
        }
        state.permits -= 1;
        true
    }

    /// Return one permit and wake the queue.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.permits += 1;
        if !state.waiters.is_empty() {
            self.condvar.notify_all();
        }
    }

    /// Reject current and future waiters. Releases still count.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.condvar.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Permits not currently held by anyone.
    pub fn available_permits(&self) -> usize {
        self.state.lock().permits
    }

    /// Number of callers blocked in [`try_acquire_for`](Self::try_acquire_for).
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

/// A permit already taken from a [`FairSemaphore`].
///
/// Dropping the guard releases the permit, so an early return or an unwind
/// cannot leak it. Call [`forget`](Self::forget) once the permit has passed
/// into other bookkeeping.
#[must_use = "dropping the permit releases it"]
pub struct Permit<'a> {
    semaphore: &'a FairSemaphore,
}

impl<'a> Permit<'a> {
    /// Guard a permit the caller took through [`FairSemaphore::try_acquire_for`].
    pub(crate) const fn held(semaphore: &'a FairSemaphore) -> Self {
        Self { semaphore }
    }

    /// Keep the permit taken. Whoever owns it now must call
    /// [`FairSemaphore::release`] exactly once.
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

impl std::fmt::Debug for Permit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permit").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for FairSemaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FairSemaphore")
            .field("permits", &state.permits)
            .field("waiting", &state.waiters.len())
            .field("closed", &state.closed)
            .finish()
    }
}

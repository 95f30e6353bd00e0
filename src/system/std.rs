//! `std` implementations of the runtime primitives.

use super::{Clock, Mailbox, Semaphore};
use heapless::Deque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`Clock`] counting from its own creation.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// A binary [`Semaphore`] built from a mutex and a condition variable.
#[derive(Debug)]
pub struct StdSemaphore {
    raised: Mutex<bool>,
    signal: Condvar,
}

impl StdSemaphore {
    /// Creates a semaphore in the taken state.
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(false),
            signal: Condvar::new(),
        }
    }
}

impl Default for StdSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Semaphore for StdSemaphore {
    fn release(&self) {
        *lock(&self.raised) = true;
        self.signal.notify_one();
    }

    fn acquire(&self, timeout_ms: u32) -> bool {
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        let guard = lock(&self.raised);
        let (mut raised, _) = self
            .signal
            .wait_timeout_while(guard, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);

        core::mem::replace(&mut *raised, false)
    }
}

/// A blocking [`Mailbox`] of capacity `N`.
///
/// [`receive`](Mailbox::receive) parks the calling thread until an item is
/// queued, so it never returns `None`.
#[derive(Debug)]
pub struct StdMailbox<T, const N: usize> {
    queue: Mutex<Deque<T, N>>,
    ready: Condvar,
}

impl<T, const N: usize> StdMailbox<T, N> {
    /// Creates an empty mailbox.
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(Deque::new()),
            ready: Condvar::new(),
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }
}

impl<T, const N: usize> Default for StdMailbox<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Mailbox<T> for StdMailbox<T, N> {
    fn try_send(&self, item: T) -> Result<(), T> {
        lock(&self.queue).push_back(item)?;
        self.ready.notify_one();
        Ok(())
    }

    fn receive(&self) -> Option<T> {
        let mut queue = self
            .ready
            .wait_while(lock(&self.queue), |queue| queue.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        queue.pop_front()
    }
}

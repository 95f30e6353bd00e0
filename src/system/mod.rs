//! Runtime primitives the firmware tasks are built on.
//!
//! The HTTP session engine and the hostname resolver never talk to an RTOS
//! directly. They are written against three small traits:
//!
//! - [`Clock`]: milliseconds since boot and a task delay
//! - [`Semaphore`]: a binary wait/signal primitive with a timeout
//! - [`Mailbox`]: a bounded FIFO used to hand work to a task
//!
//! On a cooperative, single-threaded firmware the [`LocalMailbox`] is enough.
//! With the `std` feature the [`std`](self::std) module provides thread-based
//! implementations so the same engine runs on a host.
//!
//! ```rust
//! use airclock_net::system::{LocalMailbox, Mailbox};
//!
//! let mailbox: LocalMailbox<u8, 2> = LocalMailbox::new();
//! assert!(mailbox.try_send(1).is_ok());
//! assert!(mailbox.try_send(2).is_ok());
//! assert_eq!(mailbox.try_send(3), Err(3));
//! assert_eq!(mailbox.receive(), Some(1));
//! ```

#![deny(unsafe_code)]

use core::cell::RefCell;
use heapless::Deque;

/// Host implementations backed by `std::sync` and `std::time`.
#[cfg(feature = "std")]
pub mod std;

/// A monotonic millisecond clock with a blocking delay.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;

    /// Suspends the calling task for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn delay_ms(&self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// A binary semaphore.
///
/// Releasing an already released semaphore leaves it released; it never
/// counts above one.
pub trait Semaphore {
    /// Signals the semaphore, waking one waiter.
    fn release(&self);

    /// Waits up to `timeout_ms` for the semaphore to be released and consumes
    /// the signal.
    ///
    /// Returns `false` if the timeout elapsed first. A timeout of zero polls
    /// without waiting.
    fn acquire(&self, timeout_ms: u32) -> bool;
}

/// A bounded FIFO shared between producers and one consuming task.
pub trait Mailbox<T> {
    /// Enqueues `item` without blocking; hands it back when the mailbox is full.
    fn try_send(&self, item: T) -> Result<(), T>;

    /// Takes the oldest item.
    ///
    /// Implementations able to suspend the caller block until an item arrives
    /// and always return `Some`. Cooperative implementations return `None`
    /// when the mailbox is empty.
    fn receive(&self) -> Option<T>;
}

/// A mailbox for cooperative, single-threaded firmware.
#[derive(Debug)]
pub struct LocalMailbox<T, const N: usize> {
    queue: RefCell<Deque<T, N>>,
}

impl<T, const N: usize> LocalMailbox<T, N> {
    /// Creates an empty mailbox.
    pub const fn new() -> Self {
        Self {
            queue: RefCell::new(Deque::new()),
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl<T, const N: usize> Default for LocalMailbox<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Mailbox<T> for LocalMailbox<T, N> {
    fn try_send(&self, item: T) -> Result<(), T> {
        self.queue.borrow_mut().push_back(item)
    }

    fn receive(&self) -> Option<T> {
        self.queue.borrow_mut().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mailbox_is_fifo() {
        let mailbox: LocalMailbox<u32, 5> = LocalMailbox::new();
        for i in 0..5 {
            mailbox.try_send(i).unwrap();
        }
        assert_eq!(mailbox.len(), 5);
        assert_eq!(mailbox.try_send(99), Err(99));

        for i in 0..5 {
            assert_eq!(mailbox.receive(), Some(i));
        }
        assert!(mailbox.is_empty());
        assert_eq!(mailbox.receive(), None);
    }
}

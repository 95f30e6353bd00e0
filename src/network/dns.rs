//! Hostname resolution.
//!
//! Network stacks such as lwIP resolve names asynchronously: the query either
//! answers straight from the cache or reports that it is in progress and
//! calls back later from the stack's own context. [`Resolver`] hides that
//! behind [`Resolve::resolve`], which returns at once on a cache hit and
//! otherwise suspends the calling task on a binary semaphore until the
//! callback fires or the timeout elapses.
//!
//! The resolver owns exactly one result slot. It is meant for a single
//! caller (the HTTP session task) issuing one query at a time. Each query
//! hands the backend a [`Ticket`]; a ticket from a query that already timed
//! out can no longer answer.
//!
//! ```rust
//! use core::net::Ipv4Addr;
//! use airclock_net::network::dns::{DnsQuery, Lookup, Resolve, Resolver, ResultSlot, Ticket};
//! use airclock_net::system::Semaphore;
//! use core::cell::Cell;
//!
//! struct Flag(Cell<bool>);
//! impl Semaphore for Flag {
//!     fn release(&self) { self.0.set(true) }
//!     fn acquire(&self, _timeout_ms: u32) -> bool { self.0.replace(false) }
//! }
//!
//! struct Cache;
//! impl<'s> DnsQuery<'s, Flag> for Cache {
//!     fn query(&mut self, _host: &str, _ticket: Ticket<'s, Flag>) -> Lookup {
//!         Lookup::Found(Ipv4Addr::new(192, 0, 2, 1))
//!     }
//! }
//!
//! let slot = ResultSlot::new(Flag(Cell::new(false)));
//! let mut resolver = Resolver::new(Cache, &slot);
//! assert_eq!(resolver.resolve("example.com"), Some(Ipv4Addr::new(192, 0, 2, 1)));
//! ```

use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::network::error::Errno;
use crate::system::Semaphore;

/// How long [`Resolver::resolve`] waits for an in-progress query.
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Immediate answer of a [`DnsQuery`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Lookup {
    /// The address was known (cached, or the name was a literal address).
    Found(Ipv4Addr),
    /// The query was sent; the backend will call [`Ticket::complete`].
    InProgress,
    /// The query could not be started.
    Failed(Errno),
}

/// The asynchronous resolution primitive of the network stack.
///
/// `'s` is how long the backend may keep the ticket to complete the query
/// from its own context.
pub trait DnsQuery<'s, S> {
    /// Starts resolving `host`, completing through `ticket` if the answer is
    /// not available straight away.
    fn query(&mut self, host: &str, ticket: Ticket<'s, S>) -> Lookup;
}

/// Something that maps a hostname to an IPv4 address.
pub trait Resolve {
    /// Returns the address of `hostname`, or `None` if it could not be
    /// resolved in time.
    fn resolve(&mut self, hostname: &str) -> Option<Ipv4Addr>;
}

/// The single outstanding-result slot shared with the DNS backend.
///
/// Every query gets a new generation. Only the [`Ticket`] of the query the
/// resolver is currently waiting for can store an answer; completions of
/// abandoned queries are dropped.
///
/// The address is stored as a `u32`; `0.0.0.0` means "no answer".
#[derive(Debug)]
pub struct ResultSlot<S> {
    generation: AtomicU32,
    // Generation still accepting an answer, 0 when none.
    pending: AtomicU32,
    address: AtomicU32,
    done: S,
}

impl<S: Semaphore> ResultSlot<S> {
    /// Creates an empty slot signalled through `done`.
    pub const fn new(done: S) -> Self {
        Self {
            generation: AtomicU32::new(0),
            pending: AtomicU32::new(0),
            address: AtomicU32::new(0),
            done,
        }
    }

    fn begin(&self) -> Ticket<'_, S> {
        self.address.store(0, Ordering::Release);
        // Drop a signal left behind by an earlier query.
        let _ = self.done.acquire(0);

        let generation = match self.generation.load(Ordering::Relaxed).wrapping_add(1) {
            0 => 1,
            next => next,
        };
        self.generation.store(generation, Ordering::Relaxed);
        self.pending.store(generation, Ordering::Release);

        Ticket {
            slot: self,
            generation,
        }
    }

    fn finish(&self, generation: u32, address: Option<Ipv4Addr>) -> bool {
        if self
            .pending
            .compare_exchange(generation, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.address.store(address.map_or(0, u32::from), Ordering::Release);
        self.done.release();
        true
    }

    /// Stops accepting answers for `generation`; `false` if one was
    /// already claimed.
    fn abandon(&self, generation: u32) -> bool {
        self.pending
            .compare_exchange(generation, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn wait(&self, generation: u32, timeout_ms: u32) -> Result<Option<Ipv4Addr>, ()> {
        if !self.done.acquire(timeout_ms) {
            // A failed abandon means the answer was claimed just now and its
            // signal is on the way.
            if self.abandon(generation) || !self.done.acquire(timeout_ms) {
                return Err(());
            }
        }
        let address = Ipv4Addr::from(self.address.load(Ordering::Acquire));
        Ok((!address.is_unspecified()).then_some(address))
    }
}

/// The right to answer one query, handed to the [`DnsQuery`] backend.
#[derive(Debug)]
pub struct Ticket<'s, S> {
    slot: &'s ResultSlot<S>,
    generation: u32,
}

impl<S: Semaphore> Ticket<'_, S> {
    /// Called by the backend when the query finishes, with `None` when the
    /// name does not exist or the query failed.
    ///
    /// Returns `false` if the resolver stopped waiting for this query; the
    /// answer is then discarded.
    pub fn complete(self, address: Option<Ipv4Addr>) -> bool {
        let accepted = self.slot.finish(self.generation, address);
        if !accepted {
            debug!("Dropping a late DNS answer");
        }
        accepted
    }
}

/// Timeout-bounded resolver over an asynchronous [`DnsQuery`] backend.
#[derive(Debug)]
pub struct Resolver<'s, D, S> {
    dns: D,
    slot: &'s ResultSlot<S>,
    timeout_ms: u32,
}

impl<'s, D, S> Resolver<'s, D, S>
where
    D: DnsQuery<'s, S>,
    S: Semaphore,
{
    /// Creates a resolver waiting [`DEFAULT_TIMEOUT_MS`] for each query.
    pub fn new(dns: D, slot: &'s ResultSlot<S>) -> Self {
        Self::with_timeout(dns, slot, DEFAULT_TIMEOUT_MS)
    }

    /// Creates a resolver with a custom wait.
    pub fn with_timeout(dns: D, slot: &'s ResultSlot<S>, timeout_ms: u32) -> Self {
        Self {
            dns,
            slot,
            timeout_ms,
        }
    }

    /// The wait applied to in-progress queries.
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

impl<'s, D, S> Resolve for Resolver<'s, D, S>
where
    D: DnsQuery<'s, S>,
    S: Semaphore,
{
    fn resolve(&mut self, hostname: &str) -> Option<Ipv4Addr> {
        let ticket = self.slot.begin();
        let generation = ticket.generation;

        match self.dns.query(hostname, ticket) {
            Lookup::Found(address) => {
                self.slot.abandon(generation);
                let [a, b, c, d] = address.octets();
                info!("IP address for {}: {}.{}.{}.{}", hostname, a, b, c, d);
                Some(address)
            }
            Lookup::InProgress => {
                info!("Resolving {}...", hostname);
                match self.slot.wait(generation, self.timeout_ms) {
                    Ok(Some(address)) => Some(address),
                    Ok(None) => {
                        warn!("No address found for {}", hostname);
                        None
                    }
                    Err(()) => {
                        warn!("Resolving {} timed out after {} ms", hostname, self.timeout_ms);
                        None
                    }
                }
            }
            Lookup::Failed(errno) => {
                self.slot.abandon(generation);
                error!("DNS query for {} failed: {}", hostname, errno);
                None
            }
        }
    }
}

//! Socket abstraction layer used by the HTTP session engine.
//!
//! The engine is written against a non-blocking stream-socket API in the
//! style of BSD sockets on top of lwIP: open a socket, start a `connect`
//! that may complete later, poll for writability/readability with a bounded
//! wait, then send and receive. Each operation reports failures as an
//! [`Errno`](error::Errno).
//!
//! The byte-level traits ([`Read`], [`Write`], [`Close`]) are kept separate
//! from the connection-level [`Socket`] trait so a transport can be shared
//! with other code that only needs a byte stream.

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::net::SocketAddrV4;

/// Errno values reported by the socket and DNS layers
pub mod error;

/// Asynchronous hostname resolution behind a timeout-bounded call
pub mod dns;

/// Application protocols running on top of the socket layer
pub mod application;

/// `std::net` socket stack and thread-backed DNS
#[cfg(feature = "std")]
pub mod std;

use error::Errno;

/// Re-exports of common traits
pub mod prelude {
    pub use super::dns::{DnsQuery, Resolve};
    pub use super::{Close, Read, Socket, SocketStack, Write};
}

pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection; `Ok(0)` means the peer closed it
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection, returning how much was accepted
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Push buffered data out to the peer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// Outcome of starting a non-blocking connect.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnectStatus {
    /// The connection is established.
    Connected,
    /// The handshake is under way; poll for writability to learn the result.
    InProgress,
}

/// A non-blocking TCP stream socket.
pub trait Socket: Read<Error = Errno> + Write<Error = Errno> + Close<Error = Errno> {
    /// Starts connecting to `remote`.
    fn connect(&mut self, remote: SocketAddrV4) -> Result<ConnectStatus, Errno>;

    /// Waits up to `timeout_ms` for the socket to accept writes.
    ///
    /// Returns `Ok(false)` when the wait timed out.
    fn poll_writable(&mut self, timeout_ms: u32) -> Result<bool, Errno>;

    /// Waits up to `timeout_ms` for data or an orderly shutdown from the peer.
    ///
    /// Returns `Ok(false)` when the wait timed out.
    fn poll_readable(&mut self, timeout_ms: u32) -> Result<bool, Errno>;

    /// Takes the pending asynchronous error, as `SO_ERROR` does after a
    /// non-blocking connect.
    fn take_error(&mut self) -> Result<(), Errno>;
}

/// The network stack that hands out sockets.
pub trait SocketStack {
    /// Associated socket type
    type Socket: Socket;
    /// Create a new, unconnected socket
    fn open(&mut self) -> Result<Self::Socket, Errno>;
}

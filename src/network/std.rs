//! Host networking over `std::net`.
//!
//! [`StdStack`] hands out [`StdSocket`]s wrapping a `TcpStream`. The standard
//! library has no non-blocking connect, so [`Socket::connect`] blocks for at
//! most the stack's connect timeout and always reports
//! [`ConnectStatus::Connected`] on success. Build the stack with
//! [`StdStack::with_timeout_ms`] from the session's `connect_timeout_ms` to
//! keep both bounds equal.
//!
//! Readability is polled with a read timeout and `peek`. Writability cannot
//! be polled, so [`Socket::poll_writable`] only arms the write timeout and a
//! write that times out returns `Ok(0)`. Timeouts surface as
//! [`Errno::ETIMEDOUT`].
//!
//! [`StdDns`] resolves on a short-lived thread and completes the query's
//! [`Ticket`] from there, the way an lwIP callback would.

use super::dns::{DnsQuery, Lookup, Ticket};
use super::error::Errno;
use super::{Close, ConnectStatus, Read, Socket, SocketStack, Write};
use crate::system::Semaphore;

use core::net::{Ipv4Addr, SocketAddrV4};
use std::io::{self, ErrorKind, Read as _, Write as _};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Default bound on the blocking connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

fn errno(error: &io::Error) -> Errno {
    match (error.kind(), error.raw_os_error()) {
        // EAGAIN from a socket timeout included.
        (ErrorKind::TimedOut | ErrorKind::WouldBlock, _) => Errno::ETIMEDOUT,
        (_, Some(code)) => Errno(code),
        (ErrorKind::ConnectionRefused, None) => Errno::ECONNREFUSED,
        (ErrorKind::ConnectionReset, None) => Errno::ECONNRESET,
        (ErrorKind::NotConnected, None) => Errno::ENOTCONN,
        _ => Errno::UNKNOWN,
    }
}

fn timed_out(error: &io::Error) -> bool {
    matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn wait(timeout_ms: u32) -> Duration {
    Duration::from_millis(u64::from(timeout_ms.max(1)))
}

/// Socket stack backed by the host's TCP implementation.
#[derive(Debug, Clone, Copy)]
pub struct StdStack {
    connect_timeout: Duration,
}

impl StdStack {
    /// Creates a stack whose connects give up after `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Creates a stack whose connects give up after `timeout_ms`, typically
    /// the session's `connect_timeout_ms`.
    pub fn with_timeout_ms(timeout_ms: u32) -> Self {
        Self::new(wait(timeout_ms))
    }

    /// The bound on each connect.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for StdStack {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl SocketStack for StdStack {
    type Socket = StdSocket;

    fn open(&mut self) -> Result<Self::Socket, Errno> {
        Ok(StdSocket {
            stream: None,
            connect_timeout: self.connect_timeout,
        })
    }
}

/// A [`Socket`] over `std::net::TcpStream`.
#[derive(Debug)]
pub struct StdSocket {
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl StdSocket {
    fn stream(&mut self) -> Result<&mut TcpStream, Errno> {
        self.stream.as_mut().ok_or(Errno::ENOTCONN)
    }
}

impl Read for StdSocket {
    type Error = Errno;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream()?.read(buf).map_err(|e| errno(&e))
    }
}

impl Write for StdSocket {
    type Error = Errno;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self.stream()?.write(buf) {
            Ok(written) => Ok(written),
            Err(e) if timed_out(&e) => Ok(0),
            Err(e) => Err(errno(&e)),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream()?.flush().map_err(|e| errno(&e))
    }
}

impl Close for StdSocket {
    type Error = Errno;

    fn close(self) -> Result<(), Self::Error> {
        match self.stream {
            Some(stream) => match stream.shutdown(Shutdown::Both) {
                Err(e) if e.kind() != ErrorKind::NotConnected => Err(errno(&e)),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }
}

impl Socket for StdSocket {
    fn connect(&mut self, remote: SocketAddrV4) -> Result<ConnectStatus, Errno> {
        let stream = TcpStream::connect_timeout(&SocketAddr::V4(remote), self.connect_timeout)
            .map_err(|e| errno(&e))?;
        self.stream = Some(stream);
        Ok(ConnectStatus::Connected)
    }

    fn poll_writable(&mut self, timeout_ms: u32) -> Result<bool, Errno> {
        self.stream()?
            .set_write_timeout(Some(wait(timeout_ms)))
            .map_err(|e| errno(&e))?;
        Ok(true)
    }

    fn poll_readable(&mut self, timeout_ms: u32) -> Result<bool, Errno> {
        let stream = self.stream()?;
        stream
            .set_read_timeout(Some(wait(timeout_ms)))
            .map_err(|e| errno(&e))?;

        let mut probe = [0u8; 1];
        match stream.peek(&mut probe) {
            Ok(_) => Ok(true),
            Err(e) if timed_out(&e) => Ok(false),
            Err(e) => Err(errno(&e)),
        }
    }

    fn take_error(&mut self) -> Result<(), Errno> {
        match self.stream()?.take_error() {
            Ok(None) => Ok(()),
            Ok(Some(e)) | Err(e) => Err(errno(&e)),
        }
    }
}

/// DNS backend resolving through the host resolver on a helper thread.
///
/// Literal dotted-quad names are answered immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDns;

impl<S> DnsQuery<'static, S> for StdDns
where
    S: Semaphore + Sync + 'static,
{
    fn query(&mut self, host: &str, ticket: Ticket<'static, S>) -> Lookup {
        if let Ok(address) = host.parse::<Ipv4Addr>() {
            return Lookup::Found(address);
        }

        let name = host.to_string();
        let spawned = thread::Builder::new()
            .name("dns".to_string())
            .spawn(move || {
                let address = (name.as_str(), 0)
                    .to_socket_addrs()
                    .ok()
                    .and_then(|mut found| {
                        found.find_map(|candidate| match candidate {
                            SocketAddr::V4(v4) => Some(*v4.ip()),
                            SocketAddr::V6(_) => None,
                        })
                    });
                ticket.complete(address);
            });

        match spawned {
            Ok(_) => Lookup::InProgress,
            Err(e) => Lookup::Failed(errno(&e)),
        }
    }
}

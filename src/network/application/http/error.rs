//! Failures of an HTTP exchange and of submitting one.

use crate::network::error::Errno;
use core::fmt;

/// Why an HTTP exchange ended in the `Error` state.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The hostname could not be resolved, or resolution timed out.
    Unresolved,
    /// The stack could not create a socket.
    SocketCreate(Errno),
    /// The connection was refused or failed while being established.
    Connect(Errno),
    /// The connection was not established within the connect timeout.
    ConnectTimeout,
    /// The socket failed while the request was written.
    Send(Errno),
    /// The socket stopped accepting the request; `sent` bytes made it out.
    SendTimeout {
        /// Bytes of the request already sent.
        sent: usize,
    },
    /// The socket failed while the response was read.
    Receive(Errno),
    /// The peer went silent before closing; `received` bytes had arrived.
    ReceiveTimeout {
        /// Raw response bytes read so far.
        received: usize,
    },
    /// The response body does not fit the receive buffer.
    BufferOverflow,
    /// The formatted request does not fit the send buffer.
    RequestTooLarge,
}

impl Error {
    /// Numeric code passed to [`ResponseHandler::on_error`](super::request::ResponseHandler::on_error).
    ///
    /// Socket failures carry the stack's errno; every timeout is
    /// `ETIMEDOUT`, so a refused connection and a timed-out one stay apart.
    pub const fn code(&self) -> i32 {
        match self {
            Error::Unresolved => Errno::EHOSTUNREACH.code(),
            Error::SocketCreate(errno)
            | Error::Connect(errno)
            | Error::Send(errno)
            | Error::Receive(errno) => errno.code(),
            Error::ConnectTimeout | Error::SendTimeout { .. } | Error::ReceiveTimeout { .. } => {
                Errno::ETIMEDOUT.code()
            }
            Error::BufferOverflow => Errno::ENOBUFS.code(),
            Error::RequestTooLarge => Errno::EMSGSIZE.code(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unresolved => f.write_str("hostname not resolved"),
            Error::SocketCreate(errno) => write!(f, "socket creation failed ({errno})"),
            Error::Connect(errno) => write!(f, "connect failed ({errno})"),
            Error::ConnectTimeout => f.write_str("connection timed out"),
            Error::Send(errno) => write!(f, "send failed ({errno})"),
            Error::SendTimeout { sent } => write!(f, "send timed out after {sent} bytes"),
            Error::Receive(errno) => write!(f, "receive failed ({errno})"),
            Error::ReceiveTimeout { received } => {
                write!(f, "receive timed out after {received} bytes")
            }
            Error::BufferOverflow => f.write_str("response buffer overflow"),
            Error::RequestTooLarge => f.write_str("request does not fit the send buffer"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Unresolved => defmt::write!(f, "Unresolved"),
            Error::SocketCreate(errno) => defmt::write!(f, "SocketCreate({})", errno),
            Error::Connect(errno) => defmt::write!(f, "Connect({})", errno),
            Error::ConnectTimeout => defmt::write!(f, "ConnectTimeout"),
            Error::Send(errno) => defmt::write!(f, "Send({})", errno),
            Error::SendTimeout { sent } => defmt::write!(f, "SendTimeout({})", sent),
            Error::Receive(errno) => defmt::write!(f, "Receive({})", errno),
            Error::ReceiveTimeout { received } => defmt::write!(f, "ReceiveTimeout({})", received),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::RequestTooLarge => defmt::write!(f, "RequestTooLarge"),
        }
    }
}

/// Why a descriptor was not queued.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SubmitError {
    /// The descriptor has no method; configure it first.
    Unconfigured,
    /// The session queue already holds its maximum number of requests.
    QueueFull,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Unconfigured => f.write_str("request is not configured"),
            SubmitError::QueueFull => f.write_str("session queue is full"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SubmitError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SubmitError::Unconfigured => defmt::write!(f, "Unconfigured"),
            SubmitError::QueueFull => defmt::write!(f, "QueueFull"),
        }
    }
}

//! Error values reported by the socket and DNS layers

use core::fmt;

/// An errno-style code reported by the network stack.
///
/// The values follow the numbering used by lwIP's `errno.h` (the same as
/// Linux), so codes coming from a real stack pass through unchanged.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Errno(pub i32);

impl Errno {
    /// The stack did not say what went wrong.
    pub const UNKNOWN: Errno = Errno(-1);
    /// Message too long.
    pub const EMSGSIZE: Errno = Errno(90);
    /// Connection reset by peer.
    pub const ECONNRESET: Errno = Errno(104);
    /// No buffer space available.
    pub const ENOBUFS: Errno = Errno(105);
    /// The socket is not connected.
    pub const ENOTCONN: Errno = Errno(107);
    /// Operation timed out.
    pub const ETIMEDOUT: Errno = Errno(110);
    /// Connection refused by the peer.
    pub const ECONNREFUSED: Errno = Errno(111);
    /// No route to host.
    pub const EHOSTUNREACH: Errno = Errno(113);

    /// The code handed to producers; a zero from the stack becomes `-1`.
    pub const fn code(self) -> i32 {
        if self.0 == 0 { -1 } else { self.0 }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Errno {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "errno {}", self.0)
    }
}

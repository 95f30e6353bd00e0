//! Response accumulation and header/body framing.
//!
//! The engine does not parse response headers. It only looks for the blank
//! line (`\r\n\r\n`) that ends them and keeps what follows as the body.
//! [`Framing`] selects how that marker is searched for across reads.

use super::error::Error;
use heapless::Vec;

/// Capacity of the receive buffer, in body bytes.
pub const RESPONSE_BUFFER_SIZE: usize = 2048;

/// The sequence separating headers from the body.
pub const BOUNDARY: &[u8; 4] = b"\r\n\r\n";

const CARRY_LEN: usize = BOUNDARY.len() - 1;

/// How the header/body boundary is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Every read is scanned on its own. A boundary split between two reads
    /// is never seen, so the rest of the response is dropped as header and
    /// the body comes out empty.
    #[default]
    PerChunk,
    /// The tail of the previous read is kept and scanned together with the
    /// next one, so a split boundary is still found.
    CarryOver,
}

/// Body bytes and framing progress of one exchange.
#[derive(Debug, Clone, Default)]
pub struct Response {
    body: Vec<u8, RESPONSE_BUFFER_SIZE>,
    header_found: bool,
    carry: Vec<u8, CARRY_LEN>,
}

impl Response {
    /// Body bytes received so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of body bytes received so far.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if no body byte has been received.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Whether the end of the headers has been seen.
    pub fn header_found(&self) -> bool {
        self.header_found
    }

    /// Forgets everything received.
    pub fn clear(&mut self) {
        self.body.clear();
        self.header_found = false;
        self.carry.clear();
    }

    /// Feeds one read from the socket.
    ///
    /// Header bytes are discarded. Fails with [`Error::BufferOverflow`] when
    /// the body would exceed [`RESPONSE_BUFFER_SIZE`]; nothing of the
    /// offending chunk is kept in that case.
    pub fn push_chunk(&mut self, chunk: &[u8], framing: Framing) -> Result<(), Error> {
        if self.header_found {
            return self.append(chunk);
        }

        let body_start = match framing {
            Framing::PerChunk => find_slice(chunk, BOUNDARY).map(|at| at + BOUNDARY.len()),
            Framing::CarryOver => self.find_across(chunk),
        };

        match body_start {
            Some(start) => {
                self.header_found = true;
                self.carry.clear();
                self.append(&chunk[start..])
            }
            None => {
                if framing == Framing::CarryOver {
                    self.keep_tail(chunk);
                }
                Ok(())
            }
        }
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.body
            .extend_from_slice(bytes)
            .map_err(|_| Error::BufferOverflow)
    }

    /// Index in `chunk` where the body starts, looking at the carried tail
    /// first.
    fn find_across(&self, chunk: &[u8]) -> Option<usize> {
        if !self.carry.is_empty() {
            let mut window = [0u8; 2 * CARRY_LEN];
            let head = &chunk[..chunk.len().min(CARRY_LEN)];
            let carried = self.carry.len();
            window[..carried].copy_from_slice(&self.carry);
            window[carried..carried + head.len()].copy_from_slice(head);

            if let Some(at) = find_slice(&window[..carried + head.len()], BOUNDARY) {
                return Some(at + BOUNDARY.len() - carried);
            }
        }
        find_slice(chunk, BOUNDARY).map(|at| at + BOUNDARY.len())
    }

    fn keep_tail(&mut self, chunk: &[u8]) {
        let mut joined = [0u8; 2 * CARRY_LEN];
        let carried = self.carry.len();
        joined[..carried].copy_from_slice(&self.carry);

        let tail = &chunk[chunk.len().saturating_sub(CARRY_LEN)..];
        joined[carried..carried + tail.len()].copy_from_slice(tail);

        let total = carried + tail.len();
        let keep = &joined[total.saturating_sub(CARRY_LEN)..total];
        self.carry.clear();
        // `keep` is at most CARRY_LEN long.
        let _ = self.carry.extend_from_slice(keep);
    }
}

/// Finds the first occurrence of a slice in another slice and returns its starting position.
pub(crate) fn find_slice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

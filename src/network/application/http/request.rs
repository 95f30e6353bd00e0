//! Request descriptors.
//!
//! A [`RequestDescriptor`] is everything the session engine needs for one
//! exchange: where to connect, what to ask for, buffers for both directions
//! and the [`ResponseHandler`] to report back to. Producers build one,
//! [`configure`](RequestDescriptor::configure) it and hand it to a
//! [`Submitter`](super::session::Submitter).

use core::fmt;

use super::error::Error;
use super::response::{Framing, Response};
use super::url::{self, ParseError, Url};
use heapless::Vec;

/// Capacity of the send buffer holding the formatted request.
pub const REQUEST_BUFFER_SIZE: usize = 512;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    /// Not configured yet; the engine refuses such requests.
    #[default]
    Unspecified,
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
}

impl Method {
    /// The method token as written in the request line.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Unspecified => "UNSPECIFIED",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the outcome of an exchange.
///
/// Both methods run on the session task before it picks up the next
/// request, so they must return quickly. A handler holding a
/// [`Submitter`](super::session::Submitter) may queue a new request from
/// either method.
pub trait ResponseHandler: Sync {
    /// The peer closed the connection; `body` is everything after the
    /// response headers.
    fn on_success(&self, body: &[u8]);

    /// The exchange failed with `code` (see [`Error::code`]).
    fn on_error(&self, code: i32);
}

/// A request and its buffers.
#[derive(Clone)]
pub struct RequestDescriptor<'h> {
    url: Url,
    port: u16,
    method: Method,
    request: Vec<u8, REQUEST_BUFFER_SIZE>,
    response: Response,
    handler: &'h dyn ResponseHandler,
}

impl<'h> RequestDescriptor<'h> {
    /// Creates an unconfigured descriptor reporting to `handler`.
    pub fn new(handler: &'h dyn ResponseHandler) -> Self {
        Self {
            url: Url::default(),
            port: 0,
            method: Method::Unspecified,
            request: Vec::new(),
            response: Response::default(),
            handler,
        }
    }

    /// Sets the target and method.
    ///
    /// If `url` does not parse, nothing is changed: a fresh descriptor stays
    /// unconfigured and cannot be submitted.
    pub fn configure(&mut self, url: &str, port: u16, method: Method) -> Result<(), ParseError> {
        let url = url::parse(url)?;
        self.url = url;
        self.port = port;
        self.method = method;
        Ok(())
    }

    /// Whether the descriptor may be submitted.
    pub fn is_configured(&self) -> bool {
        self.method != Method::Unspecified
    }

    /// The configured method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The URL scheme, as given.
    pub fn scheme(&self) -> &str {
        &self.url.scheme
    }

    /// The host to resolve and connect to.
    pub fn host(&self) -> &str {
        &self.url.host
    }

    /// The request target.
    pub fn path(&self) -> &str {
        &self.url.path
    }

    /// The TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The handler outcomes are reported to.
    pub fn handler(&self) -> &'h dyn ResponseHandler {
        self.handler
    }

    /// The last formatted request.
    pub fn request_bytes(&self) -> &[u8] {
        &self.request
    }

    /// Body bytes received so far.
    pub fn body(&self) -> &[u8] {
        self.response.body()
    }

    /// Number of body bytes received so far.
    pub fn received_len(&self) -> usize {
        self.response.len()
    }

    /// Whether the end of the response headers has been seen.
    pub fn header_found(&self) -> bool {
        self.response.header_found()
    }

    /// Receive-side state.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Receive-side state, for feeding socket reads into.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Feeds one socket read into the receive buffer.
    pub fn push_chunk(&mut self, chunk: &[u8], framing: Framing) -> Result<(), Error> {
        self.response.push_chunk(chunk, framing)
    }

    /// Clears both buffers and the framing state, keeping the configuration.
    ///
    /// Done on every submission so a reused descriptor starts clean.
    pub fn reset(&mut self) {
        self.request.clear();
        self.response.clear();
    }

    /// Writes the request line and headers into the send buffer.
    pub fn format_request(&mut self) -> Result<&[u8], Error> {
        self.request.clear();

        let parts: [&[u8]; 7] = [
            self.method.as_str().as_bytes(),
            b" ",
            self.url.path.as_bytes(),
            b" HTTP/1.1\r\nHost: ",
            self.url.host.as_bytes(),
            b"\r\nAccept: */*\r\nConnection: close",
            b"\r\n\r\n",
        ];
        for part in parts {
            self.request
                .extend_from_slice(part)
                .map_err(|_| Error::RequestTooLarge)?;
        }

        Ok(&self.request)
    }
}

impl fmt::Debug for RequestDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("url", &self.url)
            .field("port", &self.port)
            .field("method", &self.method)
            .field("received", &self.response.len())
            .field("header_found", &self.response.header_found())
            .finish_non_exhaustive()
    }
}

//! URL decomposition for `scheme://host[/path]`.
//!
//! The parser copies components verbatim: the scheme is not checked against
//! a list, the path is not normalised and a query string is simply part of
//! the path. A URL without any `/` after the host is reported as
//! [`ParseError::MissingPath`], which still carries the host and a `/` path.

use core::fmt;
use heapless::String;

/// Longest scheme kept, e.g. `https`.
pub const MAX_SCHEME_LEN: usize = 7;
/// Longest hostname kept.
pub const MAX_HOST_LEN: usize = 127;
/// Longest path kept, query string included.
pub const MAX_PATH_LEN: usize = 255;

const SCHEME_SEPARATOR: &str = "://";
const HOST_TERMINATOR: char = '/';

/// The components of a parsed URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    /// Text before `://`.
    pub scheme: String<MAX_SCHEME_LEN>,
    /// Text between `://` and the first `/`.
    pub host: String<MAX_HOST_LEN>,
    /// The first `/` and everything after it.
    pub path: String<MAX_PATH_LEN>,
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Why a URL was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// There is no `://`.
    MissingScheme,
    /// Nothing follows the host. The components are filled in, with `/` as
    /// the path, but the URL is still not accepted.
    MissingPath(Url),
    /// The scheme is longer than [`MAX_SCHEME_LEN`].
    SchemeTooLong,
    /// The host is longer than [`MAX_HOST_LEN`].
    HostTooLong,
    /// The path is longer than [`MAX_PATH_LEN`].
    PathTooLong,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingScheme => f.write_str("missing \"://\""),
            ParseError::MissingPath(url) => write!(f, "missing path after host {}", url.host),
            ParseError::SchemeTooLong => f.write_str("scheme too long"),
            ParseError::HostTooLong => f.write_str("host too long"),
            ParseError::PathTooLong => f.write_str("path too long"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ParseError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ParseError::MissingScheme => defmt::write!(f, "MissingScheme"),
            ParseError::MissingPath(url) => defmt::write!(f, "MissingPath({})", url.host.as_str()),
            ParseError::SchemeTooLong => defmt::write!(f, "SchemeTooLong"),
            ParseError::HostTooLong => defmt::write!(f, "HostTooLong"),
            ParseError::PathTooLong => defmt::write!(f, "PathTooLong"),
        }
    }
}

/// Splits `url` into scheme, host and path.
///
/// # Examples
///
/// ```rust
/// use airclock_net::network::application::http::url::{parse, ParseError};
///
/// let url = parse("http://example.com/a/b").unwrap();
/// assert_eq!(url.scheme, "http");
/// assert_eq!(url.host, "example.com");
/// assert_eq!(url.path, "/a/b");
///
/// match parse("http://example.com") {
///     Err(ParseError::MissingPath(url)) => assert_eq!(url.path, "/"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn parse(url: &str) -> Result<Url, ParseError> {
    let (scheme, rest) = url
        .split_once(SCHEME_SEPARATOR)
        .ok_or(ParseError::MissingScheme)?;
    let scheme = String::try_from(scheme).map_err(|_| ParseError::SchemeTooLong)?;

    match rest.find(HOST_TERMINATOR) {
        Some(at) => {
            let (host, path) = rest.split_at(at);
            Ok(Url {
                scheme,
                host: String::try_from(host).map_err(|_| ParseError::HostTooLong)?,
                path: String::try_from(path).map_err(|_| ParseError::PathTooLong)?,
            })
        }
        None => Err(ParseError::MissingPath(Url {
            scheme,
            host: String::try_from(rest).map_err(|_| ParseError::HostTooLong)?,
            path: String::try_from("/").map_err(|_| ParseError::PathTooLong)?,
        })),
    }
}

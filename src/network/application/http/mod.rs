//! HTTP/1.1 request engine for embedded systems.
//!
//! A single [`Session`] task owns the socket and works through a queue of
//! [`RequestDescriptor`]s one at a time: resolve the host, connect, send a
//! `Connection: close` request, then read until the peer closes. Whatever
//! follows the end of the response headers is handed to the descriptor's
//! [`ResponseHandler`]; any failure is reported there as a numeric code.
//!
//! Memory use is fixed: every descriptor carries a
//! [`REQUEST_BUFFER_SIZE`](request::REQUEST_BUFFER_SIZE) send buffer and a
//! [`RESPONSE_BUFFER_SIZE`](response::RESPONSE_BUFFER_SIZE) receive buffer,
//! and at most [`QUEUE_CAPACITY`](session::QUEUE_CAPACITY) requests wait.
//!
//! ```rust
//! use airclock_net::network::application::http::{Method, RequestDescriptor, ResponseHandler};
//!
//! struct Print;
//!
//! impl ResponseHandler for Print {
//!     fn on_success(&self, body: &[u8]) {
//!         let _ = body;
//!     }
//!     fn on_error(&self, code: i32) {
//!         let _ = code;
//!     }
//! }
//!
//! static HANDLER: Print = Print;
//!
//! let mut request = RequestDescriptor::new(&HANDLER);
//! request
//!     .configure("http://worldclockapi.com/api/json/cet/now", 80, Method::Get)
//!     .unwrap();
//! assert_eq!(request.host(), "worldclockapi.com");
//! ```

/// Exchange and submission failures
pub mod error;

/// Request descriptors and the response callback
pub mod request;

/// Response accumulation and header/body framing
pub mod response;

/// The session state machine and its producer handle
pub mod session;

/// `scheme://host/path` decomposition
pub mod url;

pub use error::{Error, SubmitError};
pub use request::{Method, RequestDescriptor, ResponseHandler};
pub use response::{Framing, Response};
pub use session::{Options, Session, State, Submitter};
pub use url::{ParseError, Url};

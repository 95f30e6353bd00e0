//! # Application Layer Network Protocols
//!
//! Protocols running on top of the [`Socket`](crate::network::Socket) layer.
//!
//! - **[`http`]**: queued HTTP/1.1 requests served by a single session task

/// HTTP request engine.
///
/// Resolves, connects, sends and receives one request at a time, reporting
/// each outcome through a callback on the request.
pub mod http;

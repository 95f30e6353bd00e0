//! # airclock-net - HTTP session engine for embedded devices
//!
//! A small, allocation-free HTTP/1.1 request engine for firmware. Producers
//! queue requests; a single session task resolves the host, connects, sends
//! the request and hands back the response body through a callback. Every
//! network wait is bounded, so a dead peer ends in an error code rather than
//! a stuck task.
//!
//! ## Features
//!
//! ### Network
//! - **Session engine**: one request in flight, FIFO queue, explicit state machine
//! - **Hostname resolution**: asynchronous DNS behind a timeout-bounded call
//! - **URL parsing**: `scheme://host/path` into fixed-capacity strings
//!
//! ### Time Sync
//! - Periodic wall-clock sync from a JSON world clock service
//!
//! ### System Utilities
//! - Clock, semaphore and mailbox seams for the host RTOS
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! airclock-net = "0.1.0"
//! ```
//!
//! ### Queueing a request
//!
//! ```rust
//! use airclock_net::network::application::http::{
//!     Method, RequestDescriptor, ResponseHandler, Submitter,
//! };
//! use airclock_net::network::application::http::session::QUEUE_CAPACITY;
//! use airclock_net::system::LocalMailbox;
//!
//! struct Ignore;
//!
//! impl ResponseHandler for Ignore {
//!     fn on_success(&self, _body: &[u8]) {}
//!     fn on_error(&self, _code: i32) {}
//! }
//!
//! let handler = Ignore;
//! let queue: LocalMailbox<RequestDescriptor<'_>, QUEUE_CAPACITY> = LocalMailbox::new();
//! let submitter = Submitter::new(&queue);
//!
//! let mut request = RequestDescriptor::new(&handler);
//! request.configure("http://example.com/status", 80, Method::Get).unwrap();
//! submitter.submit(request).unwrap();
//! assert_eq!(queue.len(), 1);
//! ```
//!
//! ## Platform Support
//!
//! The engine only needs `core`. The seams it runs on (sockets, DNS, clock,
//! semaphore, mailbox) are traits implemented by the firmware; the `std`
//! feature provides host implementations for tests and tools.
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library backends (default: disabled)
//! - `log`: Log through the `log` facade (default: enabled)
//! - `defmt`: Log through defmt instead of the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Network abstraction layer: sockets, DNS and the HTTP session engine.
///
/// The engine is written against traits so it can run on lwIP, `std::net`
/// or a scripted test double alike.
pub mod network;

/// System seams for embedded devices.
///
/// Time, signalling and message passing as the session engine needs them
/// from the host RTOS.
pub mod system;

/// Wall-clock synchronisation through the HTTP session.
pub mod timesync;

//! The HTTP session engine.
//!
//! One [`Session`] runs on its own task and serves requests strictly one at
//! a time, in submission order. Producers never touch it directly: they hand
//! configured [`RequestDescriptor`]s to a [`Submitter`] sharing the session's
//! [`Mailbox`], and hear back through the descriptor's
//! [`ResponseHandler`](super::request::ResponseHandler).
//!
//! # State machine
//!
//! ```text
//!            ┌──────────────────────────────────────────────────────────┐
//!            ▼                                                          │
//!  ┌──────┐     ┌────────────┐     ┌──────────────────────┐             │
//!  │ Idle │────▶│ Connecting │────▶│ WaitingForConnection │             │
//!  └──────┘     └────────────┘     └──────────────────────┘             │
//!      ▲              │                        │                        │
//!      │              ▼                        ▼                        │
//!      │       ┌────────────────┐    ┌────────────────────┐             │
//!      │       │ SendingRequest │───▶│ WaitingForResponse │─────────────┘
//!      │       └────────────────┘    └────────────────────┘
//!      │
//!      └──── Error ◀──── (any state on failure)
//! ```
//!
//! Every state that touches the network waits with a deadline, so a stuck
//! peer always ends in `Error` and the session returns to `Idle`.

use core::cmp;
use core::fmt;
use core::net::SocketAddrV4;

use super::error::{Error, SubmitError};
use super::request::RequestDescriptor;
use super::response::Framing;
use crate::network::dns::Resolve;
use crate::network::error::Errno;
use crate::network::{Close, ConnectStatus, Read, Socket, SocketStack, Write};
use crate::system::{Clock, Mailbox};

/// Maximum number of requests waiting for the session.
pub const QUEUE_CAPACITY: usize = 5;
/// Size of a single socket read.
pub const RECV_CHUNK_SIZE: usize = 512;

/// Default wait for a connect to complete.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u32 = 5000;
/// Default wait for the socket to accept more of the request.
pub const DEFAULT_SEND_TIMEOUT_MS: u32 = 5000;
/// Default wait for the next piece of the response.
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u32 = 20_000;
/// Default delay between two state-machine steps.
pub const DEFAULT_TICK_MS: u32 = 100;

/// Session timing and framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// How long to wait for a connect in progress.
    ///
    /// Only applies when the stack reports [`ConnectStatus::InProgress`].
    /// Stacks that connect synchronously carry their own bound, e.g.
    /// `StdStack::with_timeout_ms`, which should be given the same value.
    pub connect_timeout_ms: u32,
    /// How long to wait for the socket to take more of the request. The
    /// wait restarts whenever bytes go out.
    pub send_timeout_ms: u32,
    /// How long to wait for more of the response.
    pub receive_timeout_ms: u32,
    /// Delay after each step.
    pub tick_ms: u32,
    /// How the header/body boundary is searched for.
    pub framing: Framing,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            tick_ms: DEFAULT_TICK_MS,
            framing: Framing::PerChunk,
        }
    }
}

/// Where the session is in an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the next request.
    Idle,
    /// Resolving the host and starting the connect.
    Connecting,
    /// Waiting for a connect in progress to complete.
    WaitingForConnection,
    /// Writing the request.
    SendingRequest,
    /// Reading the response until the peer closes.
    WaitingForResponse,
    /// The exchange failed; the next step cleans up and reports it.
    Error(Error),
}

impl State {
    /// Name of the state, for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            State::Idle => "Idle",
            State::Connecting => "Connecting",
            State::WaitingForConnection => "WaitingForConnection",
            State::SendingRequest => "SendingRequest",
            State::WaitingForResponse => "WaitingForResponse",
            State::Error(_) => "Error",
        }
    }

    /// Whether a request is being worked on.
    pub const fn is_busy(&self) -> bool {
        !matches!(self, State::Idle)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for State {
    fn format(&self, f: defmt::Formatter) {
        match self {
            State::Error(error) => defmt::write!(f, "Error({})", error),
            other => defmt::write!(f, "{}", other.name()),
        }
    }
}

/// The producer side of a session.
///
/// Cheap to copy; every producer can hold its own.
pub struct Submitter<'q, Q> {
    queue: &'q Q,
}

impl<'q, Q> Submitter<'q, Q> {
    /// Creates a submitter feeding `queue`.
    pub fn new(queue: &'q Q) -> Self {
        Self { queue }
    }

    /// Queues `descriptor` behind any requests already waiting.
    ///
    /// The descriptor's buffers and framing state are cleared first, so a
    /// descriptor can be submitted again after an earlier exchange. Never
    /// blocks: a full queue is reported as [`SubmitError::QueueFull`].
    pub fn submit<'h>(&self, mut descriptor: RequestDescriptor<'h>) -> Result<(), SubmitError>
    where
        Q: Mailbox<RequestDescriptor<'h>>,
    {
        if !descriptor.is_configured() {
            warn!("Rejected request without a method");
            return Err(SubmitError::Unconfigured);
        }

        descriptor.reset();
        self.queue.try_send(descriptor).map_err(|rejected| {
            warn!("Session queue full, dropping request to {}", rejected.host());
            SubmitError::QueueFull
        })
    }
}

impl<Q> Clone for Submitter<'_, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q> Copy for Submitter<'_, Q> {}

impl<Q> fmt::Debug for Submitter<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter").finish_non_exhaustive()
    }
}

/// The HTTP session: one socket, one in-flight request, one state.
pub struct Session<'q, 'h, N, R, Q, C>
where
    N: SocketStack,
{
    stack: N,
    resolver: R,
    queue: &'q Q,
    clock: C,
    options: Options,
    state: State,
    socket: Option<N::Socket>,
    request: Option<RequestDescriptor<'h>>,
    connected: bool,
    last_error: Option<Error>,
}

impl<'q, 'h, N, R, Q, C> Session<'q, 'h, N, R, Q, C>
where
    N: SocketStack,
    R: Resolve,
    Q: Mailbox<RequestDescriptor<'h>>,
    C: Clock,
{
    /// Creates an idle session taking requests from `queue`.
    pub fn new(stack: N, resolver: R, queue: &'q Q, clock: C, options: Options) -> Self {
        Self {
            stack,
            resolver,
            queue,
            clock,
            options,
            state: State::Idle,
            socket: None,
            request: None,
            connected: false,
            last_error: None,
        }
    }

    /// A submitter feeding this session's queue.
    pub fn submitter(&self) -> Submitter<'q, Q> {
        Submitter::new(self.queue)
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The request being worked on, if any.
    pub fn in_flight(&self) -> Option<&RequestDescriptor<'h>> {
        self.request.as_ref()
    }

    /// Whether the socket is connected to the peer.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The error that ended the most recent failed exchange.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Session options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Runs the session forever, one step per tick.
    pub fn run(mut self) -> ! {
        info!("Starting http session");
        loop {
            self.tick();
        }
    }

    /// Runs one step, then waits one tick.
    pub fn tick(&mut self) {
        self.step();
        self.clock.delay_ms(self.options.tick_ms);
    }

    /// Runs the handler of the current state once.
    pub fn step(&mut self) {
        let next = match self.state {
            State::Idle => self.wait_for_request(),
            State::Connecting => self.connect().unwrap_or_else(State::Error),
            State::WaitingForConnection => self.wait_for_connection().unwrap_or_else(State::Error),
            State::SendingRequest => self.send_request().unwrap_or_else(State::Error),
            State::WaitingForResponse => self.receive_response().unwrap_or_else(State::Error),
            State::Error(error) => self.fail(error),
        };

        if next != self.state {
            debug!("{} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }

    fn wait_for_request(&mut self) -> State {
        let Some(request) = self.queue.receive() else {
            return State::Idle;
        };

        if !request.is_configured() {
            error!("Received request without a method for {}", request.host());
            return State::Idle;
        }

        self.request = Some(request);
        State::Connecting
    }

    fn connect(&mut self) -> Result<State, Error> {
        let Some(request) = self.request.as_ref() else {
            return Ok(State::Idle);
        };

        let Some(address) = self.resolver.resolve(request.host()) else {
            error!("Error during address resolving for {}", request.host());
            return Err(Error::Unresolved);
        };

        let mut socket = self.stack.open().map_err(|errno| {
            error!("Error during socket creation: {}", errno);
            Error::SocketCreate(errno)
        })?;

        info!("Connecting {}:{}...", request.host(), request.port());
        let status = socket.connect(SocketAddrV4::new(address, request.port()));
        self.socket = Some(socket);

        match status.map_err(Error::Connect)? {
            ConnectStatus::Connected => {
                info!("Connected successfully");
                self.connected = true;
                Ok(State::SendingRequest)
            }
            ConnectStatus::InProgress => Ok(State::WaitingForConnection),
        }
    }

    fn wait_for_connection(&mut self) -> Result<State, Error> {
        let socket = self
            .socket
            .as_mut()
            .ok_or(Error::Connect(Errno::ENOTCONN))?;

        if !socket
            .poll_writable(self.options.connect_timeout_ms)
            .map_err(Error::Connect)?
        {
            error!("Connection timed out");
            return Err(Error::ConnectTimeout);
        }
        socket.take_error().map_err(Error::Connect)?;

        info!("Connected successfully");
        self.connected = true;
        Ok(State::SendingRequest)
    }

    fn send_request(&mut self) -> Result<State, Error> {
        let (Some(request), Some(socket)) = (self.request.as_mut(), self.socket.as_mut()) else {
            return Err(Error::Send(Errno::ENOTCONN));
        };

        let payload = request.format_request()?;
        let timeout = self.options.send_timeout_ms;
        let mut deadline = self.clock.now_ms() + u64::from(timeout);
        let mut sent = 0;

        while sent < payload.len() {
            let remaining = deadline.saturating_sub(self.clock.now_ms());
            if remaining == 0 {
                error!("Sending request timed out after {} bytes", sent);
                return Err(Error::SendTimeout { sent });
            }

            let wait = cmp::min(u64::from(timeout), remaining) as u32;
            if !socket.poll_writable(wait).map_err(Error::Send)? {
                error!("Sending request timed out after {} bytes", sent);
                return Err(Error::SendTimeout { sent });
            }

            let written = socket.write(&payload[sent..]).map_err(Error::Send)?;
            if written > 0 {
                sent += written;
                deadline = self.clock.now_ms() + u64::from(timeout);
            }
        }
        socket.flush().map_err(Error::Send)?;

        info!(
            "A {} request was sent to {}",
            request.method().as_str(),
            request.host()
        );
        Ok(State::WaitingForResponse)
    }

    fn receive_response(&mut self) -> Result<State, Error> {
        let (Some(request), Some(socket)) = (self.request.as_mut(), self.socket.as_mut()) else {
            return Err(Error::Receive(Errno::ENOTCONN));
        };

        let mut chunk = [0u8; RECV_CHUNK_SIZE];
        let mut received = 0;
        loop {
            if !socket
                .poll_readable(self.options.receive_timeout_ms)
                .map_err(Error::Receive)?
            {
                error!("Receiving data timed out after {} bytes", received);
                return Err(Error::ReceiveTimeout { received });
            }

            let read = socket.read(&mut chunk).map_err(Error::Receive)?;
            if read == 0 {
                break;
            }
            received += read;

            request.push_chunk(&chunk[..read], self.options.framing)?;
            debug!(
                "Part of response body received (length: {}), total length: {}",
                read,
                request.received_len()
            );
        }

        info!(
            "Response from {} complete, {} body bytes",
            request.host(),
            request.received_len()
        );
        request.handler().on_success(request.body());

        self.close_socket();
        self.request = None;
        Ok(State::Idle)
    }

    fn fail(&mut self, error: Error) -> State {
        error!("HTTP session failed: {} (code {})", error, error.code());
        self.close_socket();
        self.last_error = Some(error);

        if let Some(request) = self.request.as_ref() {
            request.handler().on_error(error.code());
        }
        self.request = None;
        State::Idle
    }

    fn close_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            if let Err(errno) = socket.close() {
                warn!("Error while closing socket: {}", errno);
            }
        }
        self.connected = false;
    }
}

impl<N, R, Q, C> fmt::Debug for Session<'_, '_, N, R, Q, C>
where
    N: SocketStack,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("options", &self.options)
            .field("request", &self.request)
            .field("connected", &self.connected)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

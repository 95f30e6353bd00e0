#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use airclock_net::network::application::http::{Method, RequestDescriptor, ResponseHandler};
use airclock_net::network::dns::Resolve;
use airclock_net::network::error::Errno;
use airclock_net::network::{Close, ConnectStatus, Read, Socket, SocketStack, Write};
use airclock_net::system::{Clock, Mailbox};
use heapless::Deque;

pub const SERVER: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);

/// Time only moves when someone waits.
#[derive(Debug, Default)]
pub struct MockClock {
    now: AtomicU64,
}

impl MockClock {
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connect {
    #[default]
    Immediate,
    InProgress,
    Refused,
    NeverCompletes,
    PendingError(Errno),
}

/// What one socket does.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub open_error: Option<Errno>,
    pub connect: Connect,
    /// Most bytes a single write accepts.
    pub write_limit: Option<usize>,
    /// Total bytes after which the socket stops being writable.
    pub stall_writes_after: Option<usize>,
    /// Time each write takes.
    pub write_cost_ms: u64,
    pub chunks: Vec<Vec<u8>>,
    /// Once the chunks are used up, go silent instead of closing.
    pub stall_reads: bool,
    /// Once the chunks are used up, fail the read.
    pub read_error: Option<Errno>,
}

impl Script {
    pub fn responding(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            ..Self::default()
        }
    }
}

/// Everything that happened on the mock network.
#[derive(Debug, Default)]
pub struct Wire {
    pub opened: usize,
    pub closed: usize,
    pub max_open: usize,
    pub remotes: Vec<SocketAddrV4>,
    pub connect_at: Vec<u64>,
    pub requests: Vec<Vec<u8>>,
    pub polled_writable: Vec<u32>,
}

pub struct MockStack<'c> {
    clock: &'c MockClock,
    scripts: VecDeque<Script>,
    pub wire: Rc<RefCell<Wire>>,
}

impl<'c> MockStack<'c> {
    pub fn new(clock: &'c MockClock, scripts: Vec<Script>) -> Self {
        Self {
            clock,
            scripts: scripts.into(),
            wire: Rc::default(),
        }
    }
}

impl<'c> SocketStack for MockStack<'c> {
    type Socket = MockSocket<'c>;

    fn open(&mut self) -> Result<Self::Socket, Errno> {
        let script = self.scripts.pop_front().unwrap_or_default();
        if let Some(errno) = script.open_error {
            return Err(errno);
        }

        let mut wire = self.wire.borrow_mut();
        wire.opened += 1;
        wire.max_open = wire.max_open.max(wire.opened - wire.closed);

        Ok(MockSocket {
            clock: self.clock,
            wire: Rc::clone(&self.wire),
            chunks: script.chunks.iter().cloned().collect(),
            script,
            connected: false,
            sent: Vec::new(),
        })
    }
}

pub struct MockSocket<'c> {
    clock: &'c MockClock,
    wire: Rc<RefCell<Wire>>,
    script: Script,
    chunks: VecDeque<Vec<u8>>,
    connected: bool,
    sent: Vec<u8>,
}

impl Read for MockSocket<'_> {
    type Error = Errno;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return match self.script.read_error {
                Some(errno) => Err(errno),
                None => Ok(0),
            };
        };

        if chunk.len() > buf.len() {
            let rest = chunk.split_off(buf.len());
            self.chunks.push_front(rest);
        }
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for MockSocket<'_> {
    type Error = Errno;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Errno> {
        self.clock.advance(self.script.write_cost_ms);
        let accepted = self.script.write_limit.map_or(buf.len(), |limit| buf.len().min(limit));
        self.sent.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> Result<(), Errno> {
        Ok(())
    }
}

impl Close for MockSocket<'_> {
    type Error = Errno;

    fn close(self) -> Result<(), Errno> {
        let mut wire = self.wire.borrow_mut();
        wire.closed += 1;
        wire.requests.push(self.sent);
        Ok(())
    }
}

impl Socket for MockSocket<'_> {
    fn connect(&mut self, remote: SocketAddrV4) -> Result<ConnectStatus, Errno> {
        {
            let mut wire = self.wire.borrow_mut();
            wire.remotes.push(remote);
            wire.connect_at.push(self.clock.now_ms());
        }

        match self.script.connect {
            Connect::Immediate => {
                self.connected = true;
                Ok(ConnectStatus::Connected)
            }
            Connect::Refused => Err(Errno::ECONNREFUSED),
            Connect::InProgress | Connect::NeverCompletes | Connect::PendingError(_) => {
                Ok(ConnectStatus::InProgress)
            }
        }
    }

    fn poll_writable(&mut self, timeout_ms: u32) -> Result<bool, Errno> {
        self.wire.borrow_mut().polled_writable.push(timeout_ms);

        let stalled = match self.script.connect {
            Connect::NeverCompletes if !self.connected => true,
            _ => self
                .script
                .stall_writes_after
                .is_some_and(|limit| self.sent.len() >= limit),
        };
        if stalled {
            self.clock.advance(u64::from(timeout_ms));
            return Ok(false);
        }
        Ok(true)
    }

    fn poll_readable(&mut self, timeout_ms: u32) -> Result<bool, Errno> {
        if self.chunks.is_empty() && self.script.stall_reads {
            self.clock.advance(u64::from(timeout_ms));
            return Ok(false);
        }
        Ok(true)
    }

    fn take_error(&mut self) -> Result<(), Errno> {
        if let Connect::PendingError(errno) = self.script.connect {
            return Err(errno);
        }
        self.connected = true;
        Ok(())
    }
}

/// Answers every name with the same address.
#[derive(Debug, Default)]
pub struct MockResolver {
    pub answer: Option<Ipv4Addr>,
    pub lookups: Vec<String>,
}

impl MockResolver {
    pub fn answering(address: Ipv4Addr) -> Self {
        Self {
            answer: Some(address),
            lookups: Vec::new(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

impl Resolve for MockResolver {
    fn resolve(&mut self, hostname: &str) -> Option<Ipv4Addr> {
        self.lookups.push(hostname.to_string());
        self.answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Vec<u8>),
    Error(i32),
}

/// Shared, ordered record of callbacks.
pub type Log = Mutex<Vec<(&'static str, Outcome)>>;

pub struct Recorder<'l> {
    pub name: &'static str,
    pub log: &'l Log,
}

impl<'l> Recorder<'l> {
    pub fn new(name: &'static str, log: &'l Log) -> Self {
        Self { name, log }
    }
}

impl ResponseHandler for Recorder<'_> {
    fn on_success(&self, body: &[u8]) {
        self.log
            .lock()
            .unwrap()
            .push((self.name, Outcome::Success(body.to_vec())));
    }

    fn on_error(&self, code: i32) {
        self.log.lock().unwrap().push((self.name, Outcome::Error(code)));
    }
}

pub fn outcomes(log: &Log) -> Vec<(&'static str, Outcome)> {
    log.lock().unwrap().clone()
}

/// A mailbox handlers can share across threads.
pub struct SyncMailbox<T, const N: usize> {
    queue: Mutex<Deque<T, N>>,
}

impl<T, const N: usize> SyncMailbox<T, N> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Deque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl<T, const N: usize> Mailbox<T> for SyncMailbox<T, N> {
    fn try_send(&self, item: T) -> Result<(), T> {
        self.queue.lock().unwrap().push_back(item)
    }

    fn receive(&self) -> Option<T> {
        self.queue.lock().unwrap().pop_front()
    }
}

pub fn descriptor<'h>(handler: &'h dyn ResponseHandler, url: &str) -> RequestDescriptor<'h> {
    let mut descriptor = RequestDescriptor::new(handler);
    descriptor.configure(url, 80, Method::Get).unwrap();
    descriptor
}

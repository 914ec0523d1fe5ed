//! UDP Server
//!
//! Receives request datagrams and answers each one through an [`Answer`].

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver};

use crate::answer::Answer;
use crate::config::Config;
use crate::error::{Result, TierError};
use crate::protocol::{decode_request, encode_response, Request, Response, MAX_DATAGRAM_SIZE};

/// Datagrams queued per worker before the receive thread blocks
const QUEUE_DEPTH_PER_WORKER: usize = 64;

/// Server statistics
#[derive(Debug, Default)]
pub struct ServerStats {
    pub datagrams_received: AtomicU64,
    pub responses_sent: AtomicU64,
    pub malformed_dropped: AtomicU64,
    pub answer_failures: AtomicU64,
    pub send_failures: AtomicU64,
    pub receive_errors: AtomicU64,
}

/// Point-in-time copy of [`ServerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStatsSnapshot {
    pub datagrams_received: u64,
    pub responses_sent: u64,
    pub malformed_dropped: u64,
    pub answer_failures: u64,
    pub send_failures: u64,
    pub receive_errors: u64,
}

impl ServerStats {
    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            responses_sent: self.responses_sent.load(Ordering::Relaxed),
            malformed_dropped: self.malformed_dropped.load(Ordering::Relaxed),
            answer_failures: self.answer_failures.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable flag that asks a running server to stop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A decoded request waiting for a worker
struct Pending {
    request: Request,
    peer: SocketAddr,
}

/// UDP server for any answerer
///
/// Each cycle is receive → decode → answer → send. A datagram that fails at
/// any step is counted, logged and dropped; the loop keeps going.
pub struct Server<A> {
    config: Config,
    socket: UdpSocket,
    answerer: Arc<A>,
    stats: Arc<ServerStats>,
    shutdown: ShutdownHandle,
}

impl<A: Answer + 'static> Server<A> {
    /// Bind the listen socket
    pub fn bind(config: Config, answerer: A) -> Result<Self> {
        if config.poll_interval_ms == 0 {
            return Err(TierError::Config(
                "poll interval must be non-zero".to_string(),
            ));
        }

        let socket = UdpSocket::bind(config.listen_addr)?;
        socket.set_read_timeout(Some(config.poll_interval()))?;

        tracing::info!("Listening on udp://{}", socket.local_addr()?);

        Ok(Self {
            config,
            socket,
            answerer: Arc::new(answerer),
            stats: Arc::new(ServerStats::default()),
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Run the receive loop until shutdown is requested (blocking)
    pub fn run(&self) -> Result<()> {
        if self.config.workers == 0 {
            self.run_inline();
        } else {
            self.run_pooled()?;
        }

        tracing::info!("Server stopped: {:?}", self.stats.snapshot());
        Ok(())
    }

    /// Run the server on a background thread
    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr()?;
        let shutdown = self.shutdown_handle();
        let stats = self.stats();

        let thread = thread::Builder::new()
            .name("tierkv-server".to_string())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            addr,
            shutdown,
            stats,
            thread,
        })
    }

    /// Strictly sequential: every datagram is handled on the receive thread
    fn run_inline(&self) {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        while let Some((len, peer)) = self.recv_next(&mut buf) {
            handle_datagram(&self.socket, &*self.answerer, &self.stats, &buf[..len], peer);
        }
    }

    /// Receive thread answers what it can locally and feeds the rest to
    /// worker threads over a bounded channel
    ///
    /// Static and memoized cache hits therefore never queue behind a slow
    /// upstream forward.
    fn run_pooled(&self) -> Result<()> {
        let workers = self.config.workers;
        let (tx, rx) = channel::bounded::<Pending>(workers * QUEUE_DEPTH_PER_WORKER);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            handles.push(self.spawn_worker(id, rx.clone())?);
        }
        drop(rx);

        tracing::debug!("Started {} workers", workers);

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        while let Some((len, peer)) = self.recv_next(&mut buf) {
            let Some(request) = decode_datagram(&self.stats, &buf[..len], peer) else {
                continue;
            };

            if let Some(response) = self.answerer.answer_local(&request) {
                send_response(&self.socket, &self.stats, &response, peer);
                continue;
            }

            if tx.send(Pending { request, peer }).is_err() {
                tracing::error!("All workers exited, stopping receive loop");
                break;
            }
        }

        // Closing the channel lets workers drain and exit
        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
        Ok(())
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<Pending>) -> Result<JoinHandle<()>> {
        let socket = self.socket.try_clone()?;
        let answerer = Arc::clone(&self.answerer);
        let stats = Arc::clone(&self.stats);

        let handle = thread::Builder::new()
            .name(format!("tierkv-worker-{}", id))
            .spawn(move || {
                for pending in rx.iter() {
                    answer_and_reply(&socket, &*answerer, &stats, &pending.request, pending.peer);
                }
            })?;
        Ok(handle)
    }

    /// Wait for the next datagram; `None` once shutdown is requested
    fn recv_next(&self, buf: &mut [u8]) -> Option<(usize, SocketAddr)> {
        loop {
            if self.shutdown.is_shutdown() {
                return None;
            }

            match self.socket.recv_from(buf) {
                Ok((len, peer)) => {
                    self.stats.datagrams_received.fetch_add(1, Ordering::Relaxed);
                    return Some((len, peer));
                }
                Err(e) if is_transient(e.kind()) => {
                    tracing::trace!("Receive returned {}, retrying", e);
                    continue;
                }
                Err(e) => {
                    // Persistent socket errors would otherwise spin this loop
                    self.stats.receive_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Receive error: {}", e);
                    thread::sleep(self.config.poll_interval());
                }
            }
        }
    }
}

/// Errors after which the next receive can be attempted immediately
///
/// Timeouts are the shutdown poll; a connection reset is how some platforms
/// report an ICMP unreachable for an earlier send.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock
            | ErrorKind::TimedOut
            | ErrorKind::Interrupted
            | ErrorKind::ConnectionReset
    )
}

/// Handle one datagram: decode, answer, reply to the sender
fn handle_datagram<A: Answer + ?Sized>(
    socket: &UdpSocket,
    answerer: &A,
    stats: &ServerStats,
    frame: &[u8],
    peer: SocketAddr,
) {
    if let Some(request) = decode_datagram(stats, frame, peer) {
        answer_and_reply(socket, answerer, stats, &request, peer);
    }
}

fn decode_datagram(stats: &ServerStats, frame: &[u8], peer: SocketAddr) -> Option<Request> {
    match decode_request(frame) {
        Ok(request) => {
            tracing::debug!("{} -> Req({})", peer, request.key);
            Some(request)
        }
        Err(e) => {
            stats.malformed_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Dropping datagram from {}: {}", peer, e);
            None
        }
    }
}

fn answer_and_reply<A: Answer + ?Sized>(
    socket: &UdpSocket,
    answerer: &A,
    stats: &ServerStats,
    request: &Request,
    peer: SocketAddr,
) {
    match answerer.answer(request) {
        Ok(response) => send_response(socket, stats, &response, peer),
        Err(e) => {
            stats.answer_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("No answer for Req({}) from {}: {}", request.key, peer, e);
        }
    }
}

fn send_response(socket: &UdpSocket, stats: &ServerStats, response: &Response, peer: SocketAddr) {
    match response.value() {
        Some(value) => tracing::debug!("<- Res({})", value),
        None => tracing::debug!("<- Res(NOTFOUND)"),
    }

    match socket.send_to(&encode_response(response), peer) {
        Ok(_) => {
            stats.responses_sent.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            stats.send_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Error replying to {}: {}", peer, e);
        }
    }
}

/// A server running on a background thread
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    stats: Arc<ServerStats>,
    thread: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Request shutdown and wait for the loop to exit
    pub fn stop(self) -> Result<()> {
        self.shutdown.shutdown();
        self.thread
            .join()
            .map_err(|_| TierError::ServerPanicked)?
    }
}

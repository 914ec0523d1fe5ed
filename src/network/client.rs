//! UDP Client
//!
//! Issues a single lookup and waits a bounded time for the matching reply.

use std::fmt;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use crate::error::{Result, TierError};
use crate::protocol::{
    decode_response, encode_request, Request, Response, MAX_DATAGRAM_SIZE, UDP_PORT,
};

/// Default reply timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a successful protocol exchange
///
/// A missing key is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Value(u32),
    NotFound,
}

impl LookupOutcome {
    pub fn value(self) -> Option<u32> {
        match self {
            LookupOutcome::Value(v) => Some(v),
            LookupOutcome::NotFound => None,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, LookupOutcome::Value(_))
    }
}

impl From<Response> for LookupOutcome {
    fn from(response: Response) -> Self {
        match response.value() {
            Some(v) => LookupOutcome::Value(v),
            None => LookupOutcome::NotFound,
        }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupOutcome::Value(v) => write!(f, "{}", v),
            LookupOutcome::NotFound => f.write_str("NOTFOUND"),
        }
    }
}

/// Lookup client bound to one server address
///
/// Each exchange uses a fresh ephemeral socket, so independent lookups can run
/// concurrently from several threads without sharing any state.
#[derive(Debug, Clone)]
pub struct Client {
    server_addr: SocketAddr,
    timeout: Duration,
}

impl Client {
    /// Create a client with the default 2 second timeout
    pub fn new(server_addr: SocketAddr) -> Self {
        Self::with_timeout(server_addr, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(server_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            server_addr,
            timeout,
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Look up a key
    pub fn lookup(&self, key: u32) -> Result<LookupOutcome> {
        self.exchange(&Request::new(key)).map(LookupOutcome::from)
    }

    /// Send one request and return the matching response
    ///
    /// Datagrams that do not decode as a response are dropped and the wait
    /// continues until the deadline. A well-formed response for another key
    /// fails with `ProtocolMismatch`.
    pub fn exchange(&self, request: &Request) -> Result<Response> {
        if self.timeout.is_zero() {
            return Err(TierError::Config("client timeout must be non-zero".to_string()));
        }

        let socket = self.open_socket()?;
        socket.send(&encode_request(request))?;
        tracing::trace!("sent Req({}) to {}", request.key, self.server_addr);

        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TierError::Timeout(self.timeout));
            }
            socket.set_read_timeout(Some(remaining))?;

            let len = match socket.recv(&mut buf) {
                Ok(len) => len,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(TierError::Timeout(self.timeout));
                }
                Err(e) => return Err(e.into()),
            };

            let response = match decode_response(&buf[..len]) {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("dropping reply from {}: {}", self.server_addr, e);
                    continue;
                }
            };

            if response.key != request.key {
                return Err(TierError::ProtocolMismatch {
                    expected: request.key,
                    actual: response.key,
                });
            }

            return Ok(response);
        }
    }

    /// Ephemeral socket connected to the server, so the OS filters other peers
    fn open_socket(&self) -> Result<UdpSocket> {
        let local: SocketAddr = if self.server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(self.server_addr)?;
        Ok(socket)
    }
}

/// One-shot lookup with the default timeout
pub fn lookup(server_addr: SocketAddr, key: u32) -> Result<LookupOutcome> {
    Client::new(server_addr).lookup(key)
}

/// Resolve a host to the well-known lookup port
///
/// The port is a protocol constant: a `host:port` argument is rejected.
pub fn resolve(host: &str) -> Result<SocketAddr> {
    if host.parse::<SocketAddr>().is_ok() {
        return Err(TierError::Resolve(format!(
            "{}: give a host only, the port is always {}",
            host, UDP_PORT
        )));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, UDP_PORT));
    }

    (host, UDP_PORT)
        .to_socket_addrs()
        .map_err(|e| TierError::Resolve(format!("{}: {}", host, e)))?
        .next()
        .ok_or_else(|| TierError::Resolve(format!("{}: no addresses", host)))
}

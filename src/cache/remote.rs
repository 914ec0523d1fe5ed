//! Upstream answerer that forwards requests to an origin server over UDP.

use std::net::SocketAddr;
use std::time::Duration;

use crate::answer::Answer;
use crate::error::Result;
use crate::network::Client;
use crate::protocol::{Request, Response};

/// Forwards each request to a remote origin and returns its response unchanged
#[derive(Debug, Clone)]
pub struct RemoteOrigin {
    client: Client,
}

impl RemoteOrigin {
    pub fn new(origin_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            client: Client::with_timeout(origin_addr, timeout),
        }
    }

    pub fn origin_addr(&self) -> SocketAddr {
        self.client.server_addr()
    }
}

impl Answer for RemoteOrigin {
    fn answer(&self, request: &Request) -> Result<Response> {
        self.client.exchange(request)
    }
}

//! Server Tests
//!
//! These tests verify:
//! - Requests are answered to the sending address
//! - Malformed datagrams are dropped without a reply or a crash
//! - Sequential and pooled modes behave the same
//! - Shutdown stops the receive loop

use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use tierkv::network::{Server, ServerHandle};
use tierkv::protocol::{decode_response, encode_request, Request, Response, MAX_DATAGRAM_SIZE};
use tierkv::store::{OriginStore, Override};
use tierkv::{Answer, Config, Origin, Result, TierError};

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(workers: usize) -> Config {
    Config::builder()
        .listen_addr("127.0.0.1:0".parse().unwrap())
        .workers(workers)
        .poll_interval_ms(20)
        .build()
}

fn spawn_origin(workers: usize, overrides: Vec<Override>) -> ServerHandle {
    let store = OriginStore::with_overrides(overrides);
    Server::bind(test_config(workers), Origin::new(store))
        .unwrap()
        .spawn()
        .unwrap()
}

fn raw_socket() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    socket
}

fn raw_exchange(socket: &UdpSocket, server: SocketAddr, frame: &[u8]) -> Option<Response> {
    socket.send_to(frame, server).unwrap();
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((len, from)) => {
            assert_eq!(from, server);
            Some(decode_response(&buf[..len]).unwrap())
        }
        Err(_) => None,
    }
}

// =============================================================================
// Request Handling Tests
// =============================================================================

#[test]
fn test_server_answers_found_and_not_found() {
    let server = spawn_origin(0, vec![]);
    let socket = raw_socket();
    let addr = server.local_addr();

    let found = raw_exchange(&socket, addr, &encode_request(&Request::new(1)));
    assert_eq!(found, Some(Response::found(1, 11)));

    let missing = raw_exchange(&socket, addr, &encode_request(&Request::new(999)));
    assert_eq!(missing, Some(Response::not_found(999)));

    server.stop().unwrap();
}

#[test]
fn test_server_applies_overrides() {
    let server = spawn_origin(0, vec![Override::new(1, 100), Override::new(3, 123)]);
    let socket = raw_socket();
    let addr = server.local_addr();

    assert_eq!(
        raw_exchange(&socket, addr, &encode_request(&Request::new(1))),
        Some(Response::found(1, 100))
    );
    assert_eq!(
        raw_exchange(&socket, addr, &encode_request(&Request::new(3))),
        Some(Response::found(3, 123))
    );

    server.stop().unwrap();
}

#[test]
fn test_malformed_datagram_is_dropped() {
    let server = spawn_origin(0, vec![]);
    let socket = raw_socket();
    let addr = server.local_addr();

    assert_eq!(raw_exchange(&socket, addr, &[0x01, 0x02]), None);
    assert_eq!(raw_exchange(&socket, addr, &[0u8; 9]), None);

    // Server keeps serving after bad frames
    assert_eq!(
        raw_exchange(&socket, addr, &encode_request(&Request::new(2))),
        Some(Response::found(2, 22))
    );

    let stats = server.stats();
    server.stop().unwrap();

    let stats = stats.snapshot();
    assert_eq!(stats.malformed_dropped, 2);
    assert_eq!(stats.responses_sent, 1);
}

#[test]
fn test_replies_go_to_each_sender() {
    let server = spawn_origin(0, vec![]);
    let addr = server.local_addr();
    let a = raw_socket();
    let b = raw_socket();

    a.send_to(&encode_request(&Request::new(1)), addr).unwrap();
    b.send_to(&encode_request(&Request::new(2)), addr).unwrap();

    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    let (len, _) = a.recv_from(&mut buf).unwrap();
    assert_eq!(decode_response(&buf[..len]).unwrap(), Response::found(1, 11));
    let (len, _) = b.recv_from(&mut buf).unwrap();
    assert_eq!(decode_response(&buf[..len]).unwrap(), Response::found(2, 22));

    server.stop().unwrap();
}

#[test]
fn test_pooled_server_answers() {
    let server = spawn_origin(4, vec![]);
    let socket = raw_socket();
    let addr = server.local_addr();

    for _ in 0..20 {
        assert_eq!(
            raw_exchange(&socket, addr, &encode_request(&Request::new(1))),
            Some(Response::found(1, 11))
        );
    }
    assert_eq!(raw_exchange(&socket, addr, &[0xff]), None);

    let stats = server.stats();
    server.stop().unwrap();

    let stats = stats.snapshot();
    assert_eq!(stats.responses_sent, 20);
    assert_eq!(stats.malformed_dropped, 1);
}

// =============================================================================
// Failure Handling Tests
// =============================================================================

struct BrokenAnswerer;

impl Answer for BrokenAnswerer {
    fn answer(&self, request: &Request) -> Result<Response> {
        if request.key == 0 {
            Err(TierError::Config("no answer for key 0".to_string()))
        } else {
            Ok(Response::not_found(request.key))
        }
    }
}

#[test]
fn test_answer_failure_does_not_stop_loop() {
    let server = Server::bind(test_config(0), BrokenAnswerer)
        .unwrap()
        .spawn()
        .unwrap();
    let socket = raw_socket();
    let addr = server.local_addr();

    assert_eq!(raw_exchange(&socket, addr, &encode_request(&Request::new(0))), None);
    assert_eq!(
        raw_exchange(&socket, addr, &encode_request(&Request::new(5))),
        Some(Response::not_found(5))
    );
    let stats = server.stats();
    server.stop().unwrap();
    assert_eq!(stats.snapshot().answer_failures, 1);
}

/// Slow for key 1, answers key 3 without leaving the process
struct SlowMissAnswerer;

impl Answer for SlowMissAnswerer {
    fn answer(&self, request: &Request) -> Result<Response> {
        if request.key == 1 {
            thread::sleep(Duration::from_millis(1000));
        }
        Ok(self
            .answer_local(request)
            .unwrap_or_else(|| Response::not_found(request.key)))
    }

    fn answer_local(&self, request: &Request) -> Option<Response> {
        (request.key == 3).then(|| Response::found(3, 33))
    }
}

#[test]
fn test_local_answers_skip_busy_workers() {
    let server = Server::bind(test_config(1), SlowMissAnswerer)
        .unwrap()
        .spawn()
        .unwrap();
    let addr = server.local_addr();

    // Occupies the only worker for a second
    let slow = raw_socket();
    slow.send_to(&encode_request(&Request::new(1)), addr).unwrap();
    thread::sleep(Duration::from_millis(50));

    let fast = raw_socket();
    fast.set_read_timeout(Some(Duration::from_millis(300))).unwrap();
    assert_eq!(
        raw_exchange(&fast, addr, &encode_request(&Request::new(3))),
        Some(Response::found(3, 33))
    );

    server.stop().unwrap();
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_zero_poll_interval_rejected() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0".parse().unwrap())
        .poll_interval_ms(0)
        .build();

    let result = Server::bind(config, Origin::new(OriginStore::with_base()));
    assert!(matches!(result, Err(TierError::Config(_))));
}

#[test]
fn test_shutdown_stops_server() {
    let server = Server::bind(test_config(2), Origin::new(OriginStore::with_base())).unwrap();
    let shutdown = server.shutdown_handle();
    let addr = server.local_addr().unwrap();
    let handle = server.spawn().unwrap();

    assert_eq!(handle.local_addr(), addr);
    shutdown.shutdown();
    assert!(handle.shutdown_handle().is_shutdown());
    handle.stop().unwrap();
}

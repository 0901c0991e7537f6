//! One authenticated RCON session over a blocking TCP stream
//!
//! A session is strictly request/reply: `execute` writes one command and
//! reads until the reply carrying the same request id arrives. Packets
//! with any other id are leftovers from an earlier exchange and are
//! dropped. Every round trip is bounded by the configured timeout.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::packet::{
    Packet, PacketDecoder, AUTH_FAILED_ID, PACKET_AUTH, PACKET_AUTH_RESPONSE,
    PACKET_EXEC_COMMAND, PACKET_RESPONSE_VALUE,
};
use crate::config::RconConfig;
use crate::core::{AuthError, ProtocolError, RawReply};

const READ_CHUNK: usize = 8 * 1024;

/// Monotonic request id generator
///
/// Starts at 1 and wraps back to 1 instead of overflowing, so it never
/// produces the `-1` the server uses to signal a failed handshake.
#[derive(Debug, Clone)]
pub struct RequestSequence {
    next: i32,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i32) -> Self {
        Self { next: first.max(1) }
    }

    pub fn next_id(&mut self) -> i32 {
        let id = self.next;
        self.next = if id == i32::MAX { 1 } else { id + 1 };
        id
    }

    pub fn peek(&self) -> i32 {
        self.next
    }
}

impl Default for RequestSequence {
    fn default() -> Self {
        Self::new()
    }
}

fn connect(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(ErrorKind::AddrNotAvailable, "address resolved to nothing")
    }))
}

/// Authenticated connection to the server's RCON port
pub struct Session {
    stream: TcpStream,
    decoder: PacketDecoder,
    ids: RequestSequence,
    timeout: Duration,
    peer: String,
}

impl Session {
    /// Connect and run the password handshake
    ///
    /// Fails fast: a refused connection or rejected password is returned
    /// to the caller, never retried here.
    pub fn authenticate(config: &RconConfig) -> Result<Session, AuthError> {
        let addr = config.address();
        let stream = connect(&addr, config.timeout).map_err(|source| AuthError::Connect {
            addr: addr.clone(),
            source,
        })?;
        stream.set_nodelay(true).map_err(ProtocolError::from)?;
        stream
            .set_write_timeout(Some(config.timeout))
            .map_err(ProtocolError::from)?;

        let mut session = Session {
            stream,
            decoder: PacketDecoder::new(config.max_packet_size),
            ids: RequestSequence::new(),
            timeout: config.timeout,
            peer: addr,
        };

        let auth_id = session.ids.next_id();
        session.send(&Packet::new(auth_id, PACKET_AUTH, config.password.as_bytes()))?;

        let deadline = Instant::now() + session.timeout;
        loop {
            let packet = session.read_packet(deadline, auth_id)?;

            // Source-style servers emit an empty RESPONSE_VALUE ahead of the verdict
            if packet.kind != PACKET_AUTH_RESPONSE {
                debug!(id = packet.id, kind = packet.kind, "skipping pre-auth packet");
                continue;
            }
            if packet.id == AUTH_FAILED_ID {
                return Err(AuthError::Rejected);
            }
            if packet.id != auth_id {
                return Err(ProtocolError::framing(format!(
                    "auth response for unknown request {}",
                    packet.id
                ))
                .into());
            }

            info!("Authenticated RCON session with {}", session.peer);
            return Ok(session);
        }
    }

    /// Run one command and wait for its correlated reply
    pub fn execute(&mut self, command: &str) -> Result<RawReply, ProtocolError> {
        let request_id = self.ids.next_id();
        self.send(&Packet::new(
            request_id,
            PACKET_EXEC_COMMAND,
            command.as_bytes(),
        ))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let packet = self.read_packet(deadline, request_id)?;
            if packet.id == request_id && packet.kind == PACKET_RESPONSE_VALUE {
                debug!(
                    request_id,
                    bytes = packet.body.len(),
                    "received RCON reply"
                );
                return Ok(RawReply::new(request_id, packet.body));
            }
            debug!(
                expected = request_id,
                got = packet.id,
                kind = packet.kind,
                "discarding uncorrelated RCON packet"
            );
        }
    }

    /// Remote `host:port`
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Id the next request will carry
    pub fn next_request_id(&self) -> i32 {
        self.ids.peek()
    }

    /// Close the socket in both directions
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    fn send(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        self.stream.write_all(&packet.encode())?;
        self.stream.flush()?;
        Ok(())
    }

    fn read_packet(&mut self, deadline: Instant, request_id: i32) -> Result<Packet, ProtocolError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(packet) = self.decoder.decode()? {
                return Ok(packet);
            }

            let remaining = deadline
                .checked_duration_since(Instant::now())
                .filter(|d| !d.is_zero())
                .ok_or_else(|| self.timeout_error(request_id))?;
            self.stream.set_read_timeout(Some(remaining))?;

            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(ProtocolError::ConnectionClosed),
                Ok(n) => self.decoder.feed(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(self.timeout_error(request_id));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn timeout_error(&self, request_id: i32) -> ProtocolError {
        ProtocolError::Timeout {
            request_id,
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer", &self.peer)
            .field("next_request_id", &self.ids.peek())
            .finish()
    }
}

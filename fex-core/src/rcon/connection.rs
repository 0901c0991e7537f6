//! Process-wide RCON connection shared by every scrape
//!
//! The remote protocol is not multiplexed, so the session lives behind a
//! mutex that is held for exactly one request/reply round trip. Concurrent
//! scrapes queue on the lock instead of interleaving on the socket.
//!
//! ```text
//!   (none) ──execute/connect──► authenticate ──ok──► Established
//!      ▲                                                  │
//!      └──────────── any AuthError / ProtocolError ◄──────┘
//! ```
//!
//! A failed call drops the session; the next call re-authenticates.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::session::Session;
use crate::config::RconConfig;
use crate::core::{AuthError, Command, ConnectionError, RawReply};

/// Runs remote commands; the seam between fetching and the socket
pub trait CommandTransport: Send + Sync {
    /// Execute one command and return its correlated reply
    fn execute(&self, command: &Command) -> Result<RawReply, ConnectionError>;
}

impl<T: CommandTransport + ?Sized> CommandTransport for Arc<T> {
    fn execute(&self, command: &Command) -> Result<RawReply, ConnectionError> {
        (**self).execute(command)
    }
}

/// Connection state as seen from outside the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Authenticated session available
    Established,
    /// Next call will authenticate first
    Disconnected,
}

/// Lifetime counters for the shared connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Successful handshakes
    pub authentications: u64,
    /// Failed handshakes
    pub auth_failures: u64,
    /// Commands sent on an authenticated session
    pub commands: u64,
    /// Sessions dropped after a protocol error
    pub invalidations: u64,
}

struct Slot {
    session: Option<Session>,
    stats: ConnectionStats,
}

/// Lazily authenticated, mutex-guarded RCON connection
pub struct RconConnection {
    config: RconConfig,
    slot: Mutex<Slot>,
}

impl RconConnection {
    /// Create without connecting; the first call authenticates
    pub fn new(config: RconConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(Slot {
                session: None,
                stats: ConnectionStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &RconConfig {
        &self.config
    }

    /// Authenticate now unless a session already exists
    pub fn connect(&self) -> Result<(), AuthError> {
        let mut slot = self.slot.lock();
        if slot.session.is_none() {
            let session = Self::open(&self.config, &mut slot.stats)?;
            slot.session = Some(session);
        }
        Ok(())
    }

    /// Drop the current session, if any
    pub fn reset(&self) {
        if let Some(session) = self.slot.lock().session.take() {
            info!("Closing RCON session with {}", session.peer());
            session.close();
        }
    }

    pub fn state(&self) -> ConnectionState {
        if self.slot.lock().session.is_some() {
            ConnectionState::Established
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_established(&self) -> bool {
        self.state() == ConnectionState::Established
    }

    pub fn stats(&self) -> ConnectionStats {
        self.slot.lock().stats.clone()
    }

    fn open(config: &RconConfig, stats: &mut ConnectionStats) -> Result<Session, AuthError> {
        match Session::authenticate(config) {
            Ok(session) => {
                stats.authentications += 1;
                Ok(session)
            }
            Err(e) => {
                stats.auth_failures += 1;
                warn!("RCON authentication with {} failed: {}", config.address(), e);
                Err(e)
            }
        }
    }
}

impl CommandTransport for RconConnection {
    fn execute(&self, command: &Command) -> Result<RawReply, ConnectionError> {
        let mut slot = self.slot.lock();

        // Taken out of the slot so a failing session can never be put back
        let mut session = match slot.session.take() {
            Some(session) => session,
            None => Self::open(&self.config, &mut slot.stats)?,
        };

        slot.stats.commands += 1;
        match session.execute(command.payload) {
            Ok(reply) => {
                slot.session = Some(session);
                Ok(reply)
            }
            Err(e) => {
                slot.stats.invalidations += 1;
                warn!(
                    command = command.name,
                    kind = e.kind(),
                    "RCON call failed, dropping session: {}",
                    e
                );
                session.close();
                Err(e.into())
            }
        }
    }
}

impl Drop for RconConnection {
    fn drop(&mut self) {
        if let Some(session) = self.slot.get_mut().session.take() {
            session.close();
        }
    }
}

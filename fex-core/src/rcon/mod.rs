//! RCON protocol client
//!
//! - `packet`: length-framed packet codec
//! - `session`: one authenticated blocking session with request ids
//! - `connection`: process-wide, mutex-guarded session with lazy re-auth

pub mod connection;
pub mod packet;
pub mod session;

pub use connection::{CommandTransport, ConnectionState, ConnectionStats, RconConnection};
pub use packet::{Packet, PacketDecoder};
pub use session::{RequestSequence, Session};

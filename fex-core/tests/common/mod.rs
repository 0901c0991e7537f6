//! In-process RCON server for integration tests
//!
//! Speaks just enough of the protocol to authenticate and answer
//! commands, with knobs for the misbehaviours the client must survive.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fex_core::config::RconConfig;
use fex_core::core::Category;
use fex_core::data::commands;
use fex_core::rcon::packet::{
    Packet, PacketDecoder, AUTH_FAILED_ID, PACKET_AUTH, PACKET_AUTH_RESPONSE,
    PACKET_RESPONSE_VALUE,
};
use fex_core::testing::fixtures;
use parking_lot::Mutex;

/// How the server answers one command
#[derive(Debug, Clone)]
pub enum Reply {
    /// One packet with this body
    Body(String),
    /// Same packet split mid-header, then the rest in a handful of writes
    Fragmented(String),
    /// Same packet written seven bytes at a time with a pause between writes
    Drip(String, Duration),
    /// An unrelated packet first, then the real one, in a single write
    AfterStray(String),
    /// Never answer
    Silent,
    /// Close the socket instead of answering
    Close,
}

type Handler = dyn Fn(&str) -> Reply + Send + Sync;

pub struct FakeRcon {
    addr: SocketAddr,
    password: String,
    auths: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl FakeRcon {
    /// Start a server answering every command through `handler`
    pub fn start<F>(password: &str, handler: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let auths = Arc::new(AtomicUsize::new(0));
        let commands = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        {
            let password = password.to_string();
            let auths = auths.clone();
            let commands = commands.clone();
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { continue };
                    let password = password.clone();
                    let auths = auths.clone();
                    let commands = commands.clone();
                    let handler = handler.clone();
                    thread::spawn(move || {
                        serve_client(stream, &password, &auths, &commands, &*handler)
                    });
                }
            });
        }

        Self {
            addr,
            password: password.to_string(),
            auths,
            commands,
        }
    }

    /// Answer each category command with its fixture envelope
    pub fn with_fixtures(password: &str) -> Self {
        Self::start(password, |payload| match category_of(payload) {
            Some(category) => Reply::Body(fixtures::envelope(category)),
            None => Reply::Body(String::new()),
        })
    }

    /// Client configuration pointing at this server
    pub fn config(&self) -> RconConfig {
        RconConfig::new("127.0.0.1", self.addr.port(), self.password.clone())
            .with_timeout(Duration::from_millis(500))
    }

    /// Successful handshakes so far
    pub fn auth_count(&self) -> usize {
        self.auths.load(Ordering::SeqCst)
    }

    /// Command payloads received, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

/// Category whose command payload this is
pub fn category_of(payload: &str) -> Option<Category> {
    Category::ALL
        .into_iter()
        .find(|c| commands::for_category(*c).payload == payload)
}

fn serve_client(
    mut stream: TcpStream,
    password: &str,
    auths: &AtomicUsize,
    commands: &Mutex<Vec<String>>,
    handler: &Handler,
) {
    let mut decoder = PacketDecoder::new(16 * 1024 * 1024);
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        decoder.feed(&chunk[..n]);

        while let Ok(Some(packet)) = decoder.decode() {
            let body = String::from_utf8_lossy(&packet.body).into_owned();

            if packet.kind == PACKET_AUTH {
                // Real servers send an empty value packet ahead of the verdict
                let mut out = Packet::new(packet.id, PACKET_RESPONSE_VALUE, Vec::new()).encode();
                if body == password {
                    auths.fetch_add(1, Ordering::SeqCst);
                    out.extend(Packet::new(packet.id, PACKET_AUTH_RESPONSE, Vec::new()).encode());
                } else {
                    out.extend(
                        Packet::new(AUTH_FAILED_ID, PACKET_AUTH_RESPONSE, Vec::new()).encode(),
                    );
                }
                if stream.write_all(&out).is_err() {
                    return;
                }
                continue;
            }

            commands.lock().push(body.clone());
            let written = match handler(&body) {
                Reply::Body(text) => {
                    stream.write_all(&Packet::new(packet.id, PACKET_RESPONSE_VALUE, text).encode())
                }
                Reply::Fragmented(text) => {
                    let bytes = Packet::new(packet.id, PACKET_RESPONSE_VALUE, text).encode();
                    let (head, rest) = bytes.split_at(10);
                    let (size, head) = head.split_at(3);
                    let piece = (rest.len() / 8).max(1);
                    std::iter::once(size)
                        .chain(std::iter::once(head))
                        .chain(rest.chunks(piece))
                        .try_for_each(|piece| {
                            stream.write_all(piece)?;
                            stream.flush()?;
                            thread::sleep(Duration::from_millis(2));
                            Ok(())
                        })
                }
                Reply::Drip(text, pause) => {
                    let bytes = Packet::new(packet.id, PACKET_RESPONSE_VALUE, text).encode();
                    bytes.chunks(7).try_for_each(|piece| {
                        stream.write_all(piece)?;
                        stream.flush()?;
                        thread::sleep(pause);
                        Ok(())
                    })
                }
                Reply::AfterStray(text) => {
                    let mut out =
                        Packet::new(packet.id + 1000, PACKET_RESPONSE_VALUE, "stray").encode();
                    out.extend(Packet::new(packet.id, PACKET_RESPONSE_VALUE, text).encode());
                    stream.write_all(&out)
                }
                Reply::Silent => Ok(()),
                Reply::Close => return,
            };
            if written.is_err() {
                return;
            }
        }
    }
}

//! Testing utilities for unit tests, integration tests and benches
//!
//! - `ScriptedTransport`: programmable `CommandTransport` keyed by command name
//! - `fixtures`: realistic reply envelopes for every category

pub mod fixtures;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::{Category, Command, ConnectionError, RawReply};
use crate::rcon::CommandTransport;

type FailureFn = Box<dyn Fn() -> ConnectionError + Send + Sync>;

enum Script {
    Reply(String),
    Fail(FailureFn),
}

/// Transport that answers from a fixed script instead of a socket
///
/// Commands without a script get an empty reply.
pub struct ScriptedTransport {
    scripts: HashMap<&'static str, Script>,
    delay: Option<Duration>,
    calls: Mutex<Vec<&'static str>>,
    next_id: AtomicI32,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Answer the category's command with `body`
    pub fn reply(self, category: Category, body: impl Into<String>) -> Self {
        self.reply_to(category.as_str(), body)
    }

    /// Answer the command named `name` with `body`
    pub fn reply_to(mut self, name: &'static str, body: impl Into<String>) -> Self {
        self.scripts.insert(name, Script::Reply(body.into()));
        self
    }

    /// Fail the category's command with the error built by `f`
    pub fn fail_with<F>(self, category: Category, f: F) -> Self
    where
        F: Fn() -> ConnectionError + Send + Sync + 'static,
    {
        self.fail_command(category.as_str(), f)
    }

    /// Fail the command named `name` with the error built by `f`
    pub fn fail_command<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn() -> ConnectionError + Send + Sync + 'static,
    {
        self.scripts.insert(name, Script::Fail(Box::new(f)));
        self
    }

    /// Answer every category with its fixture envelope
    pub fn with_fixtures(mut self) -> Self {
        for category in Category::ALL {
            self = self.reply(category, fixtures::envelope(category));
        }
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Command names in call order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTransport for ScriptedTransport {
    fn execute(&self, command: &Command) -> Result<RawReply, ConnectionError> {
        self.calls.lock().push(command.name);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.scripts.get(command.name) {
            Some(Script::Reply(body)) => Ok(RawReply::new(id, body.as_bytes().to_vec())),
            Some(Script::Fail(f)) => Err(f()),
            None => Ok(RawReply::new(id, Vec::new())),
        }
    }
}

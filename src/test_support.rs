// ABOUTME: In-memory transport and virtual clock for exercising the client without hardware
// ABOUTME: The scripted transport answers written commands with canned modem output, the pin records levels

use crate::client::Clock;
use crate::connection::Transport;
use bytes::{Buf, Bytes, BytesMut};
use embedded_hal::digital::{ErrorType, OutputPin};
use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Transport that plays back scripted modem output
///
/// Each write is matched against the front reaction only: when the written
/// text contains its trigger, the reply is queued as inbound data. Reactions
/// therefore fire in order, once each.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    inbound: BytesMut,
    reactions: VecDeque<(String, Bytes)>,
    delayed: VecDeque<(usize, Bytes)>,
    calls: usize,
    written: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data already waiting before anything is written
    pub fn pending(mut self, data: &str) -> Self {
        self.inbound.extend_from_slice(data.as_bytes());
        self
    }

    /// Reply with `reply` to the next write containing `trigger`
    pub fn on(mut self, trigger: &str, reply: &str) -> Self {
        self.reactions
            .push_back((trigger.to_string(), Bytes::copy_from_slice(reply.as_bytes())));
        self
    }

    /// Same as `on` for raw reply bytes
    pub fn on_bytes(mut self, trigger: &str, reply: &[u8]) -> Self {
        self.reactions
            .push_back((trigger.to_string(), Bytes::copy_from_slice(reply)));
        self
    }

    /// Make `data` arrive once the transport has been queried `calls` times
    pub fn deliver_after(&mut self, calls: usize, data: &str) {
        self.delayed
            .push_back((calls, Bytes::copy_from_slice(data.as_bytes())));
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Reactions that never fired
    pub fn unused_reactions(&self) -> usize {
        self.reactions.len()
    }

    fn tick(&mut self) {
        self.calls += 1;
        while self
            .delayed
            .front()
            .is_some_and(|(after, _)| self.calls >= *after)
        {
            if let Some((_, data)) = self.delayed.pop_front() {
                self.inbound.extend_from_slice(&data);
            }
        }
    }
}

impl Transport for ScriptedTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(data);

        let text = String::from_utf8_lossy(data);
        let fires = self
            .reactions
            .front()
            .is_some_and(|(trigger, _)| text.contains(trigger.as_str()));
        if fires {
            if let Some((_, reply)) = self.reactions.pop_front() {
                self.inbound.extend_from_slice(&reply);
            }
        }
        Ok(())
    }

    fn read_line(&mut self, _timeout: Duration) -> io::Result<Bytes> {
        self.tick();
        let end = match self.inbound.iter().position(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => self.inbound.len(),
        };
        Ok(self.inbound.split_to(end).freeze())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.tick();
        Ok(self.inbound.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        self.tick();
        let n = buf.len().min(self.inbound.len());
        buf[..n].copy_from_slice(&self.inbound[..n]);
        self.inbound.advance(n);
        Ok(n)
    }
}

/// Virtual clock that only moves when something sleeps on it
///
/// Clones share the same time, so a test can keep one handle while the
/// client owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Total time slept so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }
}

/// Output pin that records every level it is driven to (`true` = high)
#[derive(Debug, Default)]
pub struct RecordingPin {
    pub levels: Vec<bool>,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.push(true);
        Ok(())
    }
}

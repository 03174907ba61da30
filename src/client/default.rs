// ABOUTME: Default modem client holding the transport, clock and per-session state
// ABOUTME: Implements the transaction engine, notification classifier and confirmation protocol

use crate::client::error::ModemResult;
use crate::client::poll::{Clock, PollPolicy, SystemClock};
use crate::client::traits::AtSession;
use crate::client::types::ModemConfig;
use crate::codec::{self, decode};
use crate::connection::Transport;
use crate::datatypes::{Accept, AtCommand, Confirmation, ExpectedLines, Notification};
use bytes::BytesMut;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Marks the end of an inline payload (Ctrl-Z)
const CTRL_Z: u8 = 0x1A;

/// Any wait allowance beyond this is slept before the first read
const PRE_READ_GRACE: Duration = Duration::from_millis(1000);

type MessageCallback = Box<dyn FnMut(u32)>;
type CarrierCallback = Box<dyn FnMut()>;
type CallerIdCallback = Box<dyn FnMut(&str)>;

/// Default SIM800 client
///
/// Owns the transport for the whole session and implements every client
/// trait on top of it. Calls are strictly sequential; there is no
/// background reader, so unsolicited notifications are only seen when an
/// operation polls for them (or flushes them before a command).
pub struct Sim800<T: Transport, C: Clock + Clone = SystemClock> {
    /// Byte channel to the modem
    pub(crate) transport: T,
    /// Source of time for every wait
    pub(crate) clock: C,
    pub(crate) config: ModemConfig,
    /// Last index announced by `+CMTI`
    msgid: Option<u32>,
    /// Trailing lines from the last multi-line transaction
    saved: String,
    on_message: Option<MessageCallback>,
    on_no_carrier: Option<CarrierCallback>,
    on_caller_id: Option<CallerIdCallback>,
}

impl<T: Transport> Sim800<T> {
    /// Create a client over `transport` using the system clock
    pub fn new(transport: T, config: ModemConfig) -> Self {
        Sim800::with_clock(transport, config, SystemClock)
    }
}

impl<T: Transport, C: Clock + Clone> Sim800<T, C> {
    /// Create a client over `transport` with an explicit time source
    pub fn with_clock(transport: T, config: ModemConfig, clock: C) -> Self {
        Sim800 {
            transport,
            clock,
            config,
            msgid: None,
            saved: String::new(),
            on_message: None,
            on_no_carrier: None,
            on_caller_id: None,
        }
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Index of the last message announced by the modem
    pub fn get_msgid(&self) -> Option<u32> {
        self.msgid
    }

    /// Call `callback` with the storage index of every `+CMTI` seen
    pub fn on_incoming_message(&mut self, callback: impl FnMut(u32) + 'static) {
        self.on_message = Some(Box::new(callback));
    }

    /// Call `callback` whenever `NO CARRIER` is seen
    pub fn on_no_carrier(&mut self, callback: impl FnMut() + 'static) {
        self.on_no_carrier = Some(Box::new(callback));
    }

    /// Call `callback` with the raw `RING` / `+CLIP` line
    pub fn on_caller_id(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_caller_id = Some(Box::new(callback));
    }

    /// Consume the client and hand back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Poll `attempt` every `poll_interval` until it yields or `timeout` passes
    pub(crate) fn poll<R>(
        &mut self,
        timeout: Duration,
        mut attempt: impl FnMut(&mut Self) -> ModemResult<Option<R>>,
    ) -> ModemResult<Option<R>> {
        let clock = self.clock.clone();
        PollPolicy::new(self.config.poll_interval, timeout).run(&clock, || attempt(self))
    }

    /// Read one line and decode it, trimmed. Empty when nothing arrived.
    fn read_decoded_line(&mut self) -> ModemResult<(bool, String)> {
        let raw = self.transport.read_line(self.config.read_timeout)?;
        if raw.is_empty() {
            return Ok((false, String::new()));
        }
        let line = decode(&raw)?.trim().to_string();
        trace!("<- {}", line);
        Ok((true, line))
    }

    fn write_command(&mut self, command: &AtCommand) -> ModemResult<()> {
        trace!("-> {}", command.text());

        let mut out = BytesMut::with_capacity(command.text().len() + 1);
        codec::encode_into(command.text(), &mut out)?;
        out.extend_from_slice(b"\n");
        self.transport.write_all(&out)?;

        if let Some(payload) = command.inline_payload() {
            trace!("-> {} byte payload", payload.len());
            let mut out = BytesMut::with_capacity(payload.len() + 1);
            codec::encode_into(payload, &mut out)?;
            out.extend_from_slice(&[CTRL_Z]);
            self.transport.write_all(&out)?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> ModemResult<()> {
        // Classify rather than discard so message and call callbacks still fire
        while self.transport.bytes_available()? > 0 {
            let notification = self.check_incoming()?;
            trace!("Flushed {:?}", notification);
        }
        Ok(())
    }

    fn read_until_idle(&mut self, first: String) -> ModemResult<Option<String>> {
        let mut lines = Vec::new();
        if !first.is_empty() {
            lines.push(first);
        }
        while self.transport.bytes_available()? > 0 {
            let (_, line) = self.read_decoded_line()?;
            if !line.is_empty() {
                lines.push(line);
            }
        }

        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(lines.join("\n")))
        }
    }

    fn save_trailing_lines(&mut self, count: u16) -> ModemResult<()> {
        let mut kept = Vec::new();
        for _ in 1..count {
            let (received, line) = self.read_decoded_line()?;
            if !received {
                break;
            }
            if line.is_empty() || line == "OK" || line.starts_with("+CMTI") {
                continue;
            }
            kept.push(line);
        }
        self.saved = kept.join("\n");
        Ok(())
    }

    fn notify(&mut self, notification: &Notification, line: &str) {
        match notification {
            Notification::IncomingMessage(index) => {
                self.msgid = Some(*index);
                if let Some(callback) = self.on_message.as_mut() {
                    callback(*index);
                }
            }
            Notification::NoCarrier => {
                if let Some(callback) = self.on_no_carrier.as_mut() {
                    callback();
                }
            }
            Notification::RingOrCallerId => {
                if let Some(callback) = self.on_caller_id.as_mut() {
                    callback(line);
                }
            }
            _ => {}
        }
    }
}

impl<T: Transport, C: Clock + Clone> AtSession for Sim800<T, C> {
    fn transact(&mut self, command: &AtCommand) -> ModemResult<Option<String>> {
        if command.flushes_pending() {
            self.flush_pending()?;
        }

        self.write_command(command)?;

        let lines = command.expected_lines();
        if lines == ExpectedLines::None {
            return Ok(None);
        }

        if let Some(extra) = command.wait_allowance().checked_sub(PRE_READ_GRACE) {
            if !extra.is_zero() {
                self.clock.sleep(extra);
            }
        }

        let (_, mut first) = self.read_decoded_line()?;
        if lines == ExpectedLines::UntilIdle {
            return self.read_until_idle(first);
        }

        if first.is_empty() {
            // Some replies start with a bare terminator
            first = self.read_decoded_line()?.1;
        }

        if let ExpectedLines::Multi(count) = lines {
            self.save_trailing_lines(count)?;
        }

        if first.is_empty() {
            Ok(None)
        } else {
            Ok(Some(first))
        }
    }

    fn check_incoming(&mut self) -> ModemResult<Notification> {
        if self.transport.bytes_available()? == 0 {
            return Ok(Notification::Generic(None));
        }

        let mut line = self.read_decoded_line()?.1;
        while line.is_empty() && self.transport.bytes_available()? > 0 {
            line = self.read_decoded_line()?.1;
        }

        let notification = Notification::parse(&line);
        self.notify(&notification, &line);
        Ok(notification)
    }

    fn command_ok(
        &mut self,
        text: &str,
        accept: Accept,
        timeout: Duration,
    ) -> ModemResult<Confirmation> {
        let reply = self.command(text)?;

        let confirmation = match reply.as_deref() {
            Some("OK") => Some(Confirmation::Ok),
            Some("DOWNLOAD") if accept.download => Some(Confirmation::Download),
            Some("ERROR") if accept.error => Some(Confirmation::Error),
            Some(other) => {
                error!("{} answered {}", text, other);
                Some(Confirmation::Failed)
            }
            None => None,
        };
        if let Some(confirmation) = confirmation {
            return Ok(confirmation);
        }

        debug!("No immediate reply to {}, waiting for acknowledgement", text);
        let deferred = self.poll(timeout, |session| {
            Ok(match session.check_incoming()? {
                Notification::Ok => Some(Confirmation::Ok),
                Notification::Download if accept.download => Some(Confirmation::Download),
                Notification::Error if accept.error => Some(Confirmation::Error),
                _ => None,
            })
        })?;

        Ok(deferred.unwrap_or_else(|| {
            error!("Timed out after {:?} waiting for {} to be acknowledged", timeout, text);
            Confirmation::Failed
        }))
    }

    fn saved_buffer(&self) -> &str {
        &self.saved
    }
}

impl<T: Transport + fmt::Debug, C: Clock + Clone> fmt::Debug for Sim800<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sim800")
            .field("transport", &self.transport)
            .field("clock", &self.clock)
            .field("config", &self.config)
            .field("msgid", &self.msgid)
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ManualClock, ScriptedTransport};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn modem(transport: ScriptedTransport) -> (Sim800<ScriptedTransport, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (
            Sim800::with_clock(transport, ModemConfig::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_single_line_reply() {
        let transport = ScriptedTransport::new().on("AT+CSQ", "+CSQ: 20,0\r\n\r\nOK\r\n");
        let (mut modem, _) = modem(transport);

        assert_eq!(modem.command("AT+CSQ").unwrap(), Some("+CSQ: 20,0".to_string()));
        assert_eq!(modem.transport.written_text(), "AT+CSQ\n");
    }

    #[test]
    fn test_empty_first_line_is_read_again() {
        let transport = ScriptedTransport::new().on("AT+CCID", "\r\n8939100000000000000\r\n\r\nOK\r\n");
        let (mut modem, _) = modem(transport);

        assert_eq!(
            modem.command("AT+CCID").unwrap(),
            Some("8939100000000000000".to_string())
        );
    }

    #[test]
    fn test_fire_and_forget_does_not_read() {
        let transport = ScriptedTransport::new().on("AT+CMGD=2", "\r\nOK\r\n");
        let (mut modem, _) = modem(transport);

        let reply = modem
            .transact(&AtCommand::new("AT+CMGD=2").lines(ExpectedLines::None))
            .unwrap();
        assert_eq!(reply, None);
        assert!(modem.transport.bytes_available().unwrap() > 0);
    }

    #[test]
    fn test_flush_discards_stale_lines_and_fires_callbacks() {
        let transport = ScriptedTransport::new()
            .pending("\r\n+CMTI: \"SM\",5\r\nstale\r\n")
            .on("AT+CSQ", "+CSQ: 9,0\r\n");
        let (mut modem, _) = modem(transport);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        modem.on_incoming_message(move |index| sink.borrow_mut().push(index));

        assert_eq!(modem.command("AT+CSQ").unwrap(), Some("+CSQ: 9,0".to_string()));
        assert_eq!(*seen.borrow(), vec![5]);
        assert_eq!(modem.get_msgid(), Some(5));
    }

    #[test]
    fn test_no_flush_keeps_buffered_reply() {
        let transport = ScriptedTransport::new().pending("+CNTP: 1\r\n");
        let (mut modem, _) = modem(transport);

        let reply = modem.transact(&AtCommand::new("AT").no_flush()).unwrap();
        assert_eq!(reply, Some("+CNTP: 1".to_string()));
    }

    #[test]
    fn test_inline_payload_is_terminated_with_ctrl_z() {
        let transport = ScriptedTransport::new();
        let (mut modem, _) = modem(transport);

        modem
            .transact(
                &AtCommand::new("AT+CMGS=\"+39123\"")
                    .payload("hi")
                    .lines(ExpectedLines::None),
            )
            .unwrap();
        assert_eq!(modem.transport.written(), b"AT+CMGS=\"+39123\"\nhi\x1a");
    }

    #[test]
    fn test_long_wait_sleeps_before_reading() {
        let transport = ScriptedTransport::new().on("AT+X", "OK\r\n");
        let (mut modem, clock) = modem(transport);

        modem
            .transact(&AtCommand::new("AT+X").wait(Duration::from_millis(5000)))
            .unwrap();
        assert_eq!(clock.elapsed(), Duration::from_millis(4000));

        modem.transact(&AtCommand::new("AT+X")).unwrap();
        assert_eq!(clock.elapsed(), Duration::from_millis(4000));
    }

    #[test]
    fn test_until_idle_joins_lines() {
        let transport = ScriptedTransport::new().on("ATI", "\r\nSIM800 R14.18\r\n\r\nOK\r\n");
        let (mut modem, _) = modem(transport);

        let reply = modem
            .transact(&AtCommand::new("ATI").lines(ExpectedLines::UntilIdle))
            .unwrap();
        assert_eq!(reply, Some("SIM800 R14.18\nOK".to_string()));

        let reply = modem
            .transact(&AtCommand::new("ATI").lines(ExpectedLines::UntilIdle))
            .unwrap();
        assert_eq!(reply, None);
    }

    #[test]
    fn test_multi_line_reply_fills_saved_buffer() {
        let transport = ScriptedTransport::new().on(
            "AT+CMGR=1",
            "\r\n+CMGR: \"REC READ\",\"+39\",\"\",\"24/01/02,10:20:30+04\"\r\nfirst\r\n+CMTI: \"SM\",2\r\nsecond\r\n\r\nOK\r\n",
        );
        let (mut modem, _) = modem(transport);

        let header = modem
            .transact(&AtCommand::new("AT+CMGR=1").lines(ExpectedLines::Multi(99)))
            .unwrap();
        assert!(header.unwrap().starts_with("+CMGR:"));
        assert_eq!(modem.saved_buffer(), "first\nsecond");
    }

    #[test]
    fn test_multi_line_reply_honours_line_limit() {
        let transport = ScriptedTransport::new().on("AT+X", "head\r\na\r\nb\r\nc\r\n");
        let (mut modem, _) = modem(transport);

        modem
            .transact(&AtCommand::new("AT+X").lines(ExpectedLines::Multi(3)))
            .unwrap();
        assert_eq!(modem.saved_buffer(), "a\nb");
    }

    #[test]
    fn test_check_incoming_without_data_is_immediate() {
        let (mut modem, clock) = modem(ScriptedTransport::new());
        assert_eq!(modem.check_incoming().unwrap(), Notification::Generic(None));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_check_incoming_skips_blank_lines() {
        let transport = ScriptedTransport::new().pending("\r\n\r\nNO CARRIER\r\n");
        let (mut modem, _) = modem(transport);

        let dropped = Rc::new(RefCell::new(0));
        let sink = dropped.clone();
        modem.on_no_carrier(move || *sink.borrow_mut() += 1);

        assert_eq!(modem.check_incoming().unwrap(), Notification::NoCarrier);
        assert_eq!(*dropped.borrow(), 1);
    }

    #[test]
    fn test_caller_id_callback_gets_raw_line() {
        let transport = ScriptedTransport::new().pending("+CLIP: \"+39555\",145\r\n");
        let (mut modem, _) = modem(transport);

        let seen = Rc::new(RefCell::new(String::new()));
        let sink = seen.clone();
        modem.on_caller_id(move |line| *sink.borrow_mut() = line.to_string());

        assert_eq!(modem.check_incoming().unwrap(), Notification::RingOrCallerId);
        assert_eq!(*seen.borrow(), "+CLIP: \"+39555\",145");
    }

    #[test]
    fn test_command_ok_inline() {
        let transport = ScriptedTransport::new()
            .on("AT+A", "OK\r\n")
            .on("AT+B", "DOWNLOAD\r\n")
            .on("AT+C", "ERROR\r\n")
            .on("AT+D", "ERROR\r\n");
        let (mut modem, _) = modem(transport);
        let timeout = Duration::from_secs(1);

        assert_eq!(modem.command_ok("AT+A", Accept::ok(), timeout).unwrap(), Confirmation::Ok);
        assert_eq!(
            modem.command_ok("AT+B", Accept::ok().with_download(), timeout).unwrap(),
            Confirmation::Download
        );
        assert_eq!(
            modem.command_ok("AT+C", Accept::ok().with_error(), timeout).unwrap(),
            Confirmation::Error
        );
        assert_eq!(modem.command_ok("AT+D", Accept::ok(), timeout).unwrap(), Confirmation::Failed);
    }

    #[test]
    fn test_command_ok_deferred_acknowledgement() {
        let transport = ScriptedTransport::new().on("AT+SAPBR=1,1", "");
        let (mut modem, clock) = modem(transport);

        // The acknowledgement shows up after the immediate read came back empty
        modem.transport.deliver_after(6, "\r\nOK\r\n");
        let confirmation = modem
            .command_ok("AT+SAPBR=1,1", Accept::ok(), Duration::from_secs(10))
            .unwrap();
        assert_eq!(confirmation, Confirmation::Ok);
        assert!(clock.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_command_ok_times_out_within_deadline() {
        let transport = ScriptedTransport::new().on("AT+HANG", "");
        let (mut modem, clock) = modem(transport);

        let confirmation = modem
            .command_ok("AT+HANG", Accept::ok(), Duration::from_secs(3))
            .unwrap();
        assert_eq!(confirmation, Confirmation::Failed);
        assert!(clock.elapsed() >= Duration::from_secs(3));
        assert!(clock.elapsed() <= Duration::from_secs(3) + modem.config.poll_interval);
    }
}

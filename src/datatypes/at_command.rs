use std::time::Duration;

/// How many reply lines a command transaction collects
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExpectedLines {
    /// Fire-and-forget: write the command and return immediately
    None,
    /// Read the first reply line only
    Single,
    /// Read the first line, then up to `n - 1` trailing lines into the
    /// session's saved buffer
    Multi(u16),
    /// Keep reading while the transport still has buffered data and join
    /// everything that was read
    UntilIdle,
}

/// One outbound AT command and the parameters of its transaction
///
/// Only lives for the duration of a single `AtSession::transact` call.
///
/// # Example
///
/// ```rust
/// use sim800::datatypes::{AtCommand, ExpectedLines};
/// use std::time::Duration;
///
/// let cmd = AtCommand::new("AT+CMGR=4")
///     .lines(ExpectedLines::Multi(99))
///     .wait(Duration::from_millis(500));
/// assert_eq!(cmd.text(), "AT+CMGR=4");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtCommand {
    text: String,
    lines: ExpectedLines,
    wait: Duration,
    payload: Option<String>,
    flush: bool,
}

impl AtCommand {
    /// Wait allowance used when none is given
    pub const DEFAULT_WAIT: Duration = Duration::from_millis(500);

    /// Create a single-line command that flushes pending input first
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lines: ExpectedLines::Single,
            wait: Self::DEFAULT_WAIT,
            payload: None,
            flush: true,
        }
    }

    /// Set how many reply lines to collect
    pub fn lines(mut self, lines: ExpectedLines) -> Self {
        self.lines = lines;
        self
    }

    /// Set the wait allowance before the first read
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Attach an inline payload terminated by Ctrl-Z (SMS body upload)
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Keep (rather than drain) whatever is already buffered on the transport
    pub fn no_flush(mut self) -> Self {
        self.flush = false;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expected_lines(&self) -> ExpectedLines {
        self.lines
    }

    pub fn wait_allowance(&self) -> Duration {
        self.wait
    }

    pub fn inline_payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn flushes_pending(&self) -> bool {
        self.flush
    }
}

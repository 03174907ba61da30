// ABOUTME: Supporting types for modem client operations including timing configuration and request builders
// ABOUTME: Provides simplified interfaces for HTTP and NTP exchanges with sensible defaults

use crate::client::error::{ModemError, ModemResult};
use crate::datatypes::HttpMethod;
use std::time::Duration;

/// Timing and sizing configuration for a modem session
///
/// # Example
///
/// ```rust
/// use sim800::client::ModemConfig;
/// use std::time::Duration;
///
/// let config = ModemConfig::default()
///     .with_read_timeout(Duration::from_secs(1))
///     .with_command_timeout(Duration::from_secs(5));
/// assert_eq!(config.poll_interval, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemConfig {
    /// Per-line read timeout handed to the transport (default: 3 seconds)
    pub read_timeout: Duration,

    /// Sleep between notification polls (default: 100 ms)
    pub poll_interval: Duration,

    /// Deadline for a confirmed command's deferred acknowledgement (default: 10 seconds)
    pub command_timeout: Duration,

    /// Wait allowance for `AT+CMGS` (default: 5000 ms)
    ///
    /// Anything above one second is slept before the first read, giving the
    /// modem time to hand the message to the network.
    pub sms_wait: Duration,

    /// Reply lines collected by `AT+CMGS` and `AT+CMGR` (default: 99)
    pub sms_lines: u16,

    /// Default deadline for HTTP exchanges (default: 10 seconds)
    pub http_timeout: Duration,

    /// Upload window announced with `AT+HTTPDATA` (default: 10 seconds)
    pub http_data_timeout: Duration,

    /// Largest HTTP body accepted from `AT+HTTPREAD` (default: 319488 bytes)
    ///
    /// Matches the size of the modem's HTTP buffer. A larger reported length
    /// is treated as a corrupted reply.
    pub http_max_body: usize,

    /// Default deadline for the NTP result notification (default: 10 seconds)
    pub ntp_timeout: Duration,

    /// Low pulse on the reset line (default: 100 ms)
    pub reset_pulse: Duration,

    /// Settle time after a reset before the SIM is queried (default: 7 seconds)
    pub reset_settle: Duration,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(100),
            command_timeout: Duration::from_secs(10),
            sms_wait: Duration::from_millis(5000),
            sms_lines: 99,
            http_timeout: Duration::from_secs(10),
            http_data_timeout: Duration::from_secs(10),
            http_max_body: 319_488,
            ntp_timeout: Duration::from_secs(10),
            reset_pulse: Duration::from_millis(100),
            reset_settle: Duration::from_secs(7),
        }
    }
}

impl ModemConfig {
    /// Set the per-line read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the interval between notification polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the deadline for confirmed commands
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the default HTTP deadline
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the largest HTTP body the client will read
    pub fn with_http_max_body(mut self, limit: usize) -> Self {
        self.http_max_body = limit;
        self
    }

    /// Set the default NTP deadline
    pub fn with_ntp_timeout(mut self, timeout: Duration) -> Self {
        self.ntp_timeout = timeout;
        self
    }

    /// Set the post-reset settle time
    pub fn with_reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }
}

/// HTTP exchange over the modem's built-in HTTP stack
///
/// Build with [`HttpRequest::get`] or [`HttpRequest::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL
    pub url: String,
    /// GET or PUT
    pub method: HttpMethod,
    /// Body uploaded for PUT
    pub data: Option<String>,
    /// Access point name used if a bearer has to be opened
    pub apn: String,
    /// Content type sent with PUT
    pub content_type: String,
    /// Optional User-Agent header
    pub user_agent: Option<String>,
    /// Enable the modem's TLS layer (`AT+HTTPSSL=1`)
    pub use_ssl: bool,
    /// Let the modem follow redirects itself (`HTTPPARA="REDIR",1`)
    pub allow_redirection: bool,
    /// Overrides `ModemConfig::http_timeout`
    pub timeout: Option<Duration>,
    /// Leave the bearer open afterwards
    pub keep_session: bool,
}

impl HttpRequest {
    /// Start building a GET request
    pub fn get(url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(HttpMethod::Get, url)
    }

    /// Start building a PUT request
    pub fn put(url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(HttpMethod::Put, url)
    }
}

/// Builder for HTTP requests with fluent API
#[derive(Debug)]
pub struct HttpRequestBuilder {
    url: String,
    method: HttpMethod,
    data: Option<String>,
    apn: Option<String>,
    content_type: String,
    user_agent: Option<String>,
    use_ssl: bool,
    allow_redirection: bool,
    timeout: Option<Duration>,
    keep_session: bool,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            data: None,
            apn: None,
            content_type: "application/json".to_string(),
            user_agent: None,
            use_ssl: false,
            allow_redirection: false,
            timeout: None,
            keep_session: false,
        }
    }

    /// Set the body uploaded with PUT
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the access point name
    pub fn apn(mut self, apn: impl Into<String>) -> Self {
        self.apn = Some(apn.into());
        self
    }

    /// Set the content type sent with PUT
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Enable TLS
    pub fn use_ssl(mut self) -> Self {
        self.use_ssl = true;
        self
    }

    /// Let the modem follow redirects
    pub fn allow_redirection(mut self) -> Self {
        self.allow_redirection = true;
        self
    }

    /// Override the exchange deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep the bearer open after the exchange
    pub fn keep_session(mut self) -> Self {
        self.keep_session = true;
        self
    }

    /// Build the request, validating what can be checked before any I/O
    pub fn build(self) -> ModemResult<HttpRequest> {
        let apn = self
            .apn
            .ok_or_else(|| ModemError::InvalidData("APN is required".to_string()))?;

        if self.url.is_empty() {
            return Err(ModemError::InvalidData("URL is required".to_string()));
        }
        if self.url.contains('"') || apn.contains('"') {
            return Err(ModemError::InvalidData(
                "URL and APN must not contain quotes".to_string(),
            ));
        }

        Ok(HttpRequest {
            url: self.url,
            method: self.method,
            data: self.data,
            apn,
            content_type: self.content_type,
            user_agent: self.user_agent,
            use_ssl: self.use_ssl,
            allow_redirection: self.allow_redirection,
            timeout: self.timeout,
            keep_session: self.keep_session,
        })
    }
}

/// Network time synchronization through `AT+CNTP`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtpRequest {
    /// NTP server host or address
    pub server: String,
    /// Local timezone as a number of quarter hours from UTC
    pub utc_quarter_offset: i8,
    /// Access point name used if a bearer has to be opened
    pub apn: String,
    /// Overrides `ModemConfig::ntp_timeout`
    pub timeout: Option<Duration>,
    /// Leave the bearer open afterwards
    pub keep_session: bool,
}

impl NtpRequest {
    /// Default NTP server (INRIM, Italy)
    pub const DEFAULT_SERVER: &'static str = "193.204.114.232";

    /// Create a request against the default server at UTC+1
    pub fn new(apn: impl Into<String>) -> Self {
        Self {
            server: Self::DEFAULT_SERVER.to_string(),
            utc_quarter_offset: 4,
            apn: apn.into(),
            timeout: None,
            keep_session: false,
        }
    }

    /// Set the NTP server
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the timezone in quarter hours from UTC
    pub fn utc_quarter_offset(mut self, quarters: i8) -> Self {
        self.utc_quarter_offset = quarters;
        self
    }

    /// Override the sync deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep the bearer open after the sync
    pub fn keep_session(mut self) -> Self {
        self.keep_session = true;
        self
    }
}

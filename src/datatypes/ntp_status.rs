use num_enum::TryFromPrimitive;
use std::fmt;

/// Result code carried by the `+CNTP: <code>` notification after `AT+CNTP`

#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NtpStatus {
    /// Network time synchronized successfully
    Success = 1,

    /// Network error
    NetworkError = 61,

    /// DNS resolution error
    DnsError = 62,

    /// Connection error
    ConnectionError = 63,

    /// Service response error
    ServiceResponseError = 64,

    /// Service response timeout
    ServiceResponseTimeout = 65,
}

impl NtpStatus {
    /// Parse the code out of a `+CNTP: <code>` line
    pub fn from_line(line: &str) -> Option<Result<NtpStatus, String>> {
        let code = line.strip_prefix("+CNTP: ")?.trim();
        Some(
            code.parse::<u8>()
                .ok()
                .and_then(|c| NtpStatus::try_from(c).ok())
                .ok_or_else(|| code.to_string()),
        )
    }

    /// Whether the modem clock was updated
    pub fn is_success(&self) -> bool {
        matches!(self, NtpStatus::Success)
    }
}

impl fmt::Display for NtpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NtpStatus::Success => "success",
            NtpStatus::NetworkError => "network error",
            NtpStatus::DnsError => "DNS resolution error",
            NtpStatus::ConnectionError => "connection error",
            NtpStatus::ServiceResponseError => "service response error",
            NtpStatus::ServiceResponseTimeout => "service response timeout",
        };
        f.write_str(text)
    }
}

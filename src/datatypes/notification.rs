// ABOUTME: Classification of single modem lines into unsolicited notifications
// ABOUTME: Pure parsing only; side effects (callbacks, message index) live in the client

use std::fmt;
use tracing::{debug, warn};

/// HTTP method selected by `AT+HTTPACTION`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `AT+HTTPACTION=0`
    Get,
    /// `AT+HTTPACTION=1`, uploading the body staged with `AT+HTTPDATA`
    Put,
}

impl HttpMethod {
    /// Action code used on the wire
    pub fn action_code(&self) -> u8 {
        match self {
            HttpMethod::Get => 0,
            HttpMethod::Put => 1,
        }
    }

    fn accepts(&self, status: &str) -> bool {
        match self {
            HttpMethod::Get => matches!(status, "200" | "301"),
            HttpMethod::Put => status == "200",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}

/// Result reported by a `+HTTPACTION` notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HttpOutcome {
    /// Accepted status with a well-formed byte count
    Success { status: u16, length: usize },
    /// Any other status, or a byte count that is not purely numeric
    Failure { status: String },
}

/// One classified line from the modem
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Ok,
    Error,
    Download,
    /// `+CMTI`: a new SMS was stored at this index
    IncomingMessage(u32),
    NoCarrier,
    /// `RING` or `+CLIP`; the caller id is not decoded
    RingOrCallerId,
    HttpActionResult {
        method: HttpMethod,
        outcome: HttpOutcome,
    },
    /// Anything else; `None` when there was nothing to read
    Generic(Option<String>),
}

impl Notification {
    /// Classify a decoded line.
    ///
    /// Deterministic: the same line always yields the same notification.
    /// Rules are checked in order and the first match wins.
    pub fn parse(line: &str) -> Notification {
        if line.starts_with("+HTTPACTION: 1") {
            return Self::parse_http_action(HttpMethod::Put, line);
        }
        if line.starts_with("+HTTPACTION: 0") {
            return Self::parse_http_action(HttpMethod::Get, line);
        }
        if line.starts_with("+CMTI") {
            return match line.split(',').nth(1).and_then(|f| f.trim().parse().ok()) {
                Some(index) => Notification::IncomingMessage(index),
                None => {
                    debug!("Malformed +CMTI notification: {}", line);
                    Notification::Generic(Some(line.to_string()))
                }
            };
        }
        if line == "NO CARRIER" {
            return Notification::NoCarrier;
        }
        if line == "RING" || line.starts_with("+CLIP") {
            return Notification::RingOrCallerId;
        }

        match line.trim() {
            "OK" => Notification::Ok,
            "DOWNLOAD" => Notification::Download,
            "ERROR" => Notification::Error,
            "" => Notification::Generic(None),
            _ => Notification::Generic(Some(line.to_string())),
        }
    }

    fn parse_http_action(method: HttpMethod, line: &str) -> Notification {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let status = fields.get(1).copied().unwrap_or_default();
        let length = fields.get(2).copied().unwrap_or_default();

        let outcome = if !method.accepts(status) {
            HttpOutcome::Failure {
                status: status.to_string(),
            }
        } else if length.is_empty() || !length.bytes().all(|b| b.is_ascii_digit()) {
            debug!("Non-numeric HTTP length in {}", line);
            HttpOutcome::Failure {
                status: status.to_string(),
            }
        } else {
            if status == "301" {
                warn!("HTTP {} answered 301, redirect not followed", method);
            }
            match (status.parse(), length.parse()) {
                (Ok(status), Ok(length)) => HttpOutcome::Success { status, length },
                _ => HttpOutcome::Failure {
                    status: status.to_string(),
                },
            }
        };

        Notification::HttpActionResult { method, outcome }
    }

    /// True for the plain `OK` acknowledgement
    pub fn is_ok(&self) -> bool {
        matches!(self, Notification::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_get_success() {
        assert_eq!(
            Notification::parse("+HTTPACTION: 0,200,5"),
            Notification::HttpActionResult {
                method: HttpMethod::Get,
                outcome: HttpOutcome::Success {
                    status: 200,
                    length: 5
                },
            }
        );
    }

    #[test]
    fn test_http_get_redirect_is_accepted() {
        assert!(matches!(
            Notification::parse("+HTTPACTION: 0,301,0"),
            Notification::HttpActionResult {
                outcome: HttpOutcome::Success { status: 301, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_http_put_only_accepts_200() {
        assert_eq!(
            Notification::parse("+HTTPACTION: 1,301,0"),
            Notification::HttpActionResult {
                method: HttpMethod::Put,
                outcome: HttpOutcome::Failure {
                    status: "301".to_string()
                },
            }
        );
        assert!(matches!(
            Notification::parse("+HTTPACTION: 1,200,12"),
            Notification::HttpActionResult {
                method: HttpMethod::Put,
                outcome: HttpOutcome::Success { length: 12, .. },
            }
        ));
    }

    #[test]
    fn test_http_failure_statuses() {
        assert_eq!(
            Notification::parse("+HTTPACTION: 0,603,0"),
            Notification::HttpActionResult {
                method: HttpMethod::Get,
                outcome: HttpOutcome::Failure {
                    status: "603".to_string()
                },
            }
        );
    }

    #[test]
    fn test_http_non_numeric_length_fails() {
        assert!(matches!(
            Notification::parse("+HTTPACTION: 0,200,5a"),
            Notification::HttpActionResult {
                outcome: HttpOutcome::Failure { .. },
                ..
            }
        ));
        assert!(matches!(
            Notification::parse("+HTTPACTION: 0,200"),
            Notification::HttpActionResult {
                outcome: HttpOutcome::Failure { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_incoming_message() {
        assert_eq!(
            Notification::parse("+CMTI: \"SM\",7"),
            Notification::IncomingMessage(7)
        );
        assert_eq!(
            Notification::parse("+CMTI: \"SM\""),
            Notification::Generic(Some("+CMTI: \"SM\"".to_string()))
        );
    }

    #[test]
    fn test_call_related_lines() {
        assert_eq!(Notification::parse("NO CARRIER"), Notification::NoCarrier);
        assert_eq!(Notification::parse("RING"), Notification::RingOrCallerId);
        assert_eq!(
            Notification::parse("+CLIP: \"+391234567890\",145,\"\",0,\"\",0"),
            Notification::RingOrCallerId
        );
    }

    #[test]
    fn test_terminal_acknowledgements() {
        assert_eq!(Notification::parse("OK"), Notification::Ok);
        assert_eq!(Notification::parse(" OK "), Notification::Ok);
        assert_eq!(Notification::parse("DOWNLOAD"), Notification::Download);
        assert_eq!(Notification::parse("ERROR"), Notification::Error);
    }

    #[test]
    fn test_unmatched_lines_are_generic() {
        assert_eq!(
            Notification::parse("+CNTP: 1"),
            Notification::Generic(Some("+CNTP: 1".to_string()))
        );
        assert_eq!(Notification::parse(""), Notification::Generic(None));
        // Exact match only
        assert_eq!(
            Notification::parse("NO CARRIER!"),
            Notification::Generic(Some("NO CARRIER!".to_string()))
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        for line in ["+HTTPACTION: 0,200,5", "+CMTI: \"SM\",2", "hello", "OK"] {
            assert_eq!(Notification::parse(line), Notification::parse(line));
        }
    }
}

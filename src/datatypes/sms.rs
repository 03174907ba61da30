// ABOUTME: SMS value types returned by the text-mode SMS commands
// ABOUTME: Parses +CMGR headers and +CMGL listing lines into explicit results

use std::fmt;

/// A message read from SIM storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsRecord {
    /// Origin phone number
    pub sender: String,
    /// Date as reported by the modem (`yy/MM/dd`)
    pub date: String,
    /// Time as reported by the modem, timezone suffix included
    pub time: String,
    /// Message body
    pub text: String,
}

impl SmsRecord {
    /// Build a record from a `+CMGR:` header line and the message body.
    ///
    /// Header format: `+CMGR: "REC READ","+391234567890","","24/01/02,10:20:30+04"`.
    /// Returns `None` when the header does not carry the `+CMGR` tag or is
    /// missing fields.
    pub fn from_header(header: &str, body: &str) -> Option<SmsRecord> {
        let fields: Vec<&str> = header.split(',').collect();
        let tag = fields.first()?.split(':').next()?;
        if tag != "+CMGR" || fields.len() < 5 {
            return None;
        }

        Some(SmsRecord {
            sender: unquote(fields[1]),
            date: unquote(fields[3]),
            time: unquote(fields[4]),
            text: body.to_string(),
        })
    }
}

/// Outcome of `AT+CMGS`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SmsSendStatus {
    Ok,
    Error,
}

impl fmt::Display for SmsSendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmsSendStatus::Ok => write!(f, "OK"),
            SmsSendStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Which messages `AT+CMGL` lists
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum MessageFilter {
    /// Only received messages not read yet
    #[default]
    Unread,
    /// Every stored message, read or unread, sent or unsent
    All,
}

impl MessageFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFilter::Unread => "REC UNREAD",
            MessageFilter::All => "ALL",
        }
    }
}

/// One `+CMGL:` listing line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListEntry {
    /// `STO SENT` / `STO UNSENT`: a draft or outgoing copy
    Stored(u32),
    /// `REC READ` / `REC UNREAD`: a received message
    Received(u32),
}

impl ListEntry {
    /// Parse `+CMGL: 4,"REC UNREAD","+39...","","24/01/02,10:20:30+04"`
    pub fn parse(line: &str) -> Option<ListEntry> {
        let rest = line.strip_prefix("+CMGL:")?;
        let mut fields = rest.split(',');
        let index = fields.next()?.trim().parse().ok()?;
        let status = unquote(fields.next()?);

        if status.starts_with("STO") {
            Some(ListEntry::Stored(index))
        } else if status.starts_with("REC") {
            Some(ListEntry::Received(index))
        } else {
            None
        }
    }
}

fn unquote(field: &str) -> String {
    field.replace('"', "").trim().to_string()
}

use std::net::Ipv4Addr;
use tracing::debug;

/// State of bearer profile 1 as reported by `AT+SAPBR=2,1`
///
/// Recomputed on every query; the driver never caches it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BearerStatus {
    /// The modem reported an address. `0.0.0.0` means the profile exists
    /// but no address is bound; callers decide what to make of it.
    Bound(Ipv4Addr),
    /// The reply did not have the expected shape
    QueryFailed,
}

impl BearerStatus {
    /// Parse `+SAPBR: 1,1,"10.176.3.12"`
    pub fn parse(reply: &str) -> BearerStatus {
        if !reply.starts_with("+SAPBR: 1,") {
            debug!("Unexpected bearer query reply: {}", reply);
            return BearerStatus::QueryFailed;
        }

        let Some(address) = reply.split(',').nth(2) else {
            debug!("Bearer query reply without address: {}", reply);
            return BearerStatus::QueryFailed;
        };

        match address.trim().trim_matches('"').parse::<Ipv4Addr>() {
            Ok(ip) => {
                if ip.is_unspecified() {
                    debug!("Bearer profile 1 has no IP address bound");
                }
                BearerStatus::Bound(ip)
            }
            Err(_) => {
                debug!("Unparseable bearer address: {}", address);
                BearerStatus::QueryFailed
            }
        }
    }

    /// The bound address, if it is a usable one
    pub fn ip(&self) -> Option<Ipv4Addr> {
        match self {
            BearerStatus::Bound(ip) if !ip.is_unspecified() => Some(*ip),
            _ => None,
        }
    }
}

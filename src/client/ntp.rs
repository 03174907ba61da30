// ABOUTME: Network time synchronization through the modem's NTP client
// ABOUTME: Opens a bearer, triggers AT+CNTP and waits for the +CNTP result code

use crate::client::default::Sim800;
use crate::client::error::ModemResult;
use crate::client::poll::Clock;
use crate::client::traits::{AtSession, DeviceInfo, GprsClient, NetworkTime};
use crate::client::types::NtpRequest;
use crate::connection::Transport;
use crate::datatypes::{Accept, Notification, NtpStatus};
use chrono::NaiveDateTime;
use tracing::{error, info, warn};

impl<T: Transport, C: Clock + Clone> NetworkTime for Sim800<T, C> {
    fn internet_sync_time(&mut self, request: &NtpRequest) -> ModemResult<Option<NaiveDateTime>> {
        let synced = self.ntp_exchange(request);
        if request.keep_session {
            return synced;
        }

        match self.disconnect_gprs() {
            Ok(true) => {}
            Ok(false) => warn!("Bearer was not closed after NTP sync"),
            Err(e) if synced.is_err() => {
                warn!("Closing the bearer after a failed NTP sync failed: {}", e)
            }
            Err(e) => return Err(e),
        }
        synced
    }
}

impl<T: Transport, C: Clock + Clone> Sim800<T, C> {
    fn ntp_exchange(&mut self, request: &NtpRequest) -> ModemResult<Option<NaiveDateTime>> {
        if self.connect_gprs(&request.apn)?.is_none() {
            return Ok(None);
        }

        let timeout = self.config.command_timeout;
        let configure = format!(
            "AT+CNTPCID=1;+CNTP=\"{}\",{}",
            request.server, request.utc_quarter_offset
        );
        if !self.command_ok(&configure, Accept::ok(), timeout)?.is_ok() {
            warn!("NTP server {} was not acknowledged", request.server);
        }
        if !self.command_ok("AT+CNTP", Accept::ok(), timeout)?.is_ok() {
            warn!("NTP sync trigger was not acknowledged");
        }

        let wait = request.timeout.unwrap_or(self.config.ntp_timeout);
        let result = self.poll(wait, |session| {
            Ok(match session.check_incoming()? {
                Notification::Generic(Some(line)) => NtpStatus::from_line(&line),
                _ => None,
            })
        })?;

        match result {
            Some(Ok(status)) if status.is_success() => {
                info!("Modem clock synchronized with {}", request.server);
                self.get_date()
            }
            Some(Ok(status)) => {
                error!("NTP sync with {} failed: {}", request.server, status);
                Ok(None)
            }
            Some(Err(code)) => {
                error!("NTP sync with {} failed with code {}", request.server, code);
                Ok(None)
            }
            None => {
                error!("Timed out waiting for NTP sync with {}", request.server);
                Ok(None)
            }
        }
    }
}

// ABOUTME: Core modem client traits layered from the raw AT session up to SMS, GPRS and device queries
// ABOUTME: Defines the extensible interfaces implemented by the default Sim800 client

use crate::client::error::ModemResult;
use crate::client::types::{HttpRequest, NtpRequest};
use crate::datatypes::{
    Accept, AtCommand, BearerStatus, Confirmation, MessageFilter, Notification,
    RegistrationStatus, SmsRecord, SmsSendStatus,
};
use chrono::NaiveDateTime;
use embedded_hal::digital::OutputPin;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Request/response exchange over the AT command channel
///
/// Everything else is built on these primitives. Implementations own the
/// transport and the per-session state (saved buffer, last message index,
/// callbacks); no operation may be issued while another is in flight.
pub trait AtSession {
    /// Run one command transaction
    ///
    /// Returns the first non-empty decoded reply line, every idle-buffered
    /// line joined for `ExpectedLines::UntilIdle`, or `None` when nothing
    /// arrived (always `None` for `ExpectedLines::None`). Extra lines of a
    /// multi-line reply end up in the saved buffer.
    fn transact(&mut self, command: &AtCommand) -> ModemResult<Option<String>>;

    /// Run a command expecting a single reply line
    fn command(&mut self, text: &str) -> ModemResult<Option<String>> {
        self.transact(&AtCommand::new(text))
    }

    /// Classify the next unsolicited line, if any is already buffered
    ///
    /// Never blocks waiting for data: with nothing buffered it returns
    /// `Notification::Generic(None)` straight away.
    fn check_incoming(&mut self) -> ModemResult<Notification>;

    /// Send a command and wait for its acknowledgement
    ///
    /// The acknowledgement is accepted either inline or, when the immediate
    /// read is empty, from later notification traffic until `timeout`.
    fn command_ok(
        &mut self,
        text: &str,
        accept: Accept,
        timeout: Duration,
    ) -> ModemResult<Confirmation>;

    /// Trailing lines kept by the last multi-line transaction
    fn saved_buffer(&self) -> &str;
}

/// Text-mode SMS operations
pub trait SmsClient: AtSession {
    /// Send `text` to `destination`
    ///
    /// Succeeds when the modem shows its `>` prompt and then confirms with
    /// `+CMGS` (or `+CUSD` for service codes).
    fn send_sms(&mut self, destination: &str, text: &str) -> ModemResult<SmsSendStatus>;

    /// Read the message stored at `index`
    fn read_sms(&mut self, index: u32) -> ModemResult<Option<SmsRecord>>;

    /// Delete the message stored at `index` without waiting for a reply
    fn delete_sms(&mut self, index: u32) -> ModemResult<()>;

    /// Read the message at `index` (when non-zero), then delete every stored message
    fn read_and_delete_all(&mut self, index: u32) -> ModemResult<Option<SmsRecord>>;

    /// Pop the next received message from the inbox
    ///
    /// Stored drafts met along the way are deleted and never returned.
    fn read_next_message(&mut self, filter: MessageFilter) -> ModemResult<Option<SmsRecord>>;
}

/// GPRS bearer management and the built-in HTTP stack
pub trait GprsClient: AtSession {
    /// Query bearer profile 1
    fn get_ip(&mut self) -> ModemResult<BearerStatus>;

    /// Open bearer profile 1 on `apn`, reusing it when already bound
    fn connect_gprs(&mut self, apn: &str) -> ModemResult<Option<Ipv4Addr>>;

    /// Close bearer profile 1
    fn disconnect_gprs(&mut self) -> ModemResult<bool>;

    /// Run an HTTP exchange and return the response body
    ///
    /// Any failed phase terminates the HTTP service and (unless the request
    /// keeps its session) closes the bearer before `None` is returned.
    fn http(&mut self, request: &HttpRequest) -> ModemResult<Option<String>>;
}

/// Network time synchronization
pub trait NetworkTime: GprsClient + DeviceInfo {
    /// Sync the modem clock over NTP and return the resulting local time
    fn internet_sync_time(&mut self, request: &NtpRequest) -> ModemResult<Option<NaiveDateTime>>;
}

/// Device setup, identity and status queries
pub trait DeviceInfo: AtSession {
    /// Apply the initial configuration (echo off, text mode, GSM charset, ...)
    fn setup(&mut self, disable_netlight: bool) -> ModemResult<bool>;

    /// Whether a SIM card is inserted
    fn check_sim(&mut self) -> ModemResult<bool>;

    /// Pulse the reset line, wait for the modem to boot and check the SIM
    fn hard_reset<P: OutputPin>(&mut self, reset_pin: &mut P) -> ModemResult<bool>;

    /// Current modem clock
    fn get_date(&mut self) -> ModemResult<Option<NaiveDateTime>>;

    /// Set the modem clock to the host's local time
    fn set_date(&mut self) -> ModemResult<bool>;

    /// Set the modem clock to `date` at `utc_quarter_offset` quarter hours from UTC
    fn set_date_to(&mut self, date: NaiveDateTime, utc_quarter_offset: i8) -> ModemResult<bool>;

    /// Network registration state
    fn registration_status(&mut self) -> ModemResult<Option<RegistrationStatus>>;

    /// Whether the modem is registered at home or roaming
    fn is_registered(&mut self) -> ModemResult<bool> {
        Ok(self
            .registration_status()?
            .is_some_and(|status| status.is_registered()))
    }

    /// Name of the operator the modem is registered with
    ///
    /// Fails with `ModemError::NotRegistered` when the modem answers `ERROR`.
    fn get_operator(&mut self) -> ModemResult<Option<String>>;

    /// Service provider name stored on the SIM
    ///
    /// Fails with `ModemError::SimUnavailable` when the modem answers `ERROR`.
    fn get_service_provider(&mut self) -> ModemResult<Option<String>>;

    /// Signal strength normalized to roughly 3..100, or 0 when unknown
    fn get_signal_strength(&mut self) -> ModemResult<Option<f64>>;

    /// Supply voltage in volts
    fn get_battery_voltage(&mut self) -> ModemResult<Option<f64>>;

    /// Subscriber number, when the SIM stores one
    fn get_msisdn(&mut self) -> ModemResult<Option<String>>;

    fn get_imsi(&mut self) -> ModemResult<Option<String>>;

    fn get_ccid(&mut self) -> ModemResult<Option<String>>;

    /// Product identification (`ATI`)
    fn get_unit_name(&mut self) -> ModemResult<Option<String>>;

    /// IMEI (`AT+CGSN`)
    fn get_serial_number(&mut self) -> ModemResult<Option<String>>;

    /// Firmware revision (`AT+CGMR`)
    fn get_hw_revision(&mut self) -> ModemResult<Option<String>>;

    /// Module temperature in degrees Celsius
    fn get_temperature(&mut self) -> ModemResult<Option<f64>>;

    fn set_charset_hex(&mut self) -> ModemResult<bool>;

    fn set_charset_ira(&mut self) -> ModemResult<bool>;
}

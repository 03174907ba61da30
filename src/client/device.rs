// ABOUTME: Device setup, reset, clock and identity queries for the default client
// ABOUTME: Parses the single-line replies of the SIM800 status commands into typed values

use crate::client::default::Sim800;
use crate::client::error::{ModemError, ModemResult};
use crate::client::poll::Clock;
use crate::client::traits::{AtSession, DeviceInfo};
use crate::connection::Transport;
use crate::datatypes::{Accept, AtCommand, ExpectedLines, RegistrationStatus};
use chrono::{Local, NaiveDateTime};
use embedded_hal::digital::OutputPin;
use tracing::{debug, error, info};

/// Layout of the date part of `+CCLK: "yy/MM/dd,hh:mm:ss+zz"`
const CCLK_FORMAT: &str = "%y/%m/%d,%H:%M:%S";

/// Seconds per quarter hour, the unit of the modem's timezone field
const QUARTER_HOUR: i32 = 15 * 60;

/// Field `index` of a `+TAG: a,b,c` reply, unquoted
fn reply_field(reply: &str, tag: &str, index: usize) -> Option<String> {
    let values = reply.strip_prefix(tag)?.strip_prefix(':')?;
    let field = values.split(',').nth(index)?.trim().trim_matches('"');
    Some(field.to_string())
}

/// Reply of a bare query (`AT+CIMI`, `ATI`, ...), unless the modem refused it
fn plain_reply(command: &str, reply: Option<String>) -> Option<String> {
    match reply {
        Some(line) if line != "ERROR" && line != "OK" => Some(line),
        other => {
            debug!("No value returned by {}: {:?}", command, other);
            None
        }
    }
}

fn parse_clock(reply: &str) -> Option<NaiveDateTime> {
    let value = reply.strip_prefix("+CCLK:")?.trim().trim_matches('"');
    NaiveDateTime::parse_from_str(value.get(..17)?, CCLK_FORMAT).ok()
}

impl<T: Transport, C: Clock + Clone> DeviceInfo for Sim800<T, C> {
    fn setup(&mut self, disable_netlight: bool) -> ModemResult<bool> {
        // Echo may still be on here, so accept OK anywhere in the reply
        let echo_off = AtCommand::new("ATE0;+IFC=1,1").lines(ExpectedLines::UntilIdle);
        let reply = self.transact(&echo_off)?.unwrap_or_default();
        if !reply.lines().any(|line| line == "OK") {
            error!("Modem did not acknowledge ATE0: {:?}", reply);
            return Ok(false);
        }

        let timeout = self.config.command_timeout;
        let init = "AT+CLIP=1;+CMGF=1;+CLTS=1;+CSCLK=0;+CSCS=\"GSM\";+CMGHEX=1";
        if !self.command_ok(init, Accept::ok(), timeout)?.is_ok() {
            return Ok(false);
        }

        if disable_netlight && !self.command_ok("AT+CNETLIGHT=0", Accept::ok(), timeout)?.is_ok() {
            return Ok(false);
        }

        info!("Modem setup complete");
        Ok(true)
    }

    fn check_sim(&mut self) -> ModemResult<bool> {
        let reply = self.command("AT+CSMINS?")?.unwrap_or_default();
        match reply_field(&reply, "+CSMINS", 1) {
            Some(inserted) => Ok(inserted == "1"),
            None => {
                debug!("Unexpected reply to AT+CSMINS?: {}", reply);
                Ok(false)
            }
        }
    }

    fn hard_reset<P: OutputPin>(&mut self, reset_pin: &mut P) -> ModemResult<bool> {
        let line_error = |err: P::Error| ModemError::ResetLine(format!("{:?}", err));

        info!("Resetting modem");
        reset_pin.set_high().map_err(line_error)?;
        reset_pin.set_low().map_err(line_error)?;
        self.clock.sleep(self.config.reset_pulse);
        reset_pin.set_high().map_err(line_error)?;
        self.clock.sleep(self.config.reset_settle);

        self.check_sim()
    }

    fn get_date(&mut self) -> ModemResult<Option<NaiveDateTime>> {
        let reply = self.command("AT+CCLK?")?.unwrap_or_default();
        let date = parse_clock(&reply);
        if date.is_none() {
            debug!("Unexpected reply to AT+CCLK?: {}", reply);
        }
        Ok(date)
    }

    fn set_date(&mut self) -> ModemResult<bool> {
        let now = Local::now();
        let quarters = now.offset().local_minus_utc() / QUARTER_HOUR;
        self.set_date_to(now.naive_local(), quarters as i8)
    }

    fn set_date_to(&mut self, date: NaiveDateTime, utc_quarter_offset: i8) -> ModemResult<bool> {
        let command = format!(
            "AT+CCLK=\"{}{:+03}\"",
            date.format(CCLK_FORMAT),
            utc_quarter_offset
        );
        let timeout = self.config.command_timeout;
        Ok(self.command_ok(&command, Accept::ok(), timeout)?.is_ok())
    }

    fn registration_status(&mut self) -> ModemResult<Option<RegistrationStatus>> {
        let reply = self.command("AT+CREG?")?.unwrap_or_default();
        let status = RegistrationStatus::from_reply(&reply);
        if status.is_none() {
            debug!("Unexpected reply to AT+CREG?: {}", reply);
        }
        Ok(status)
    }

    fn get_operator(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+COPS?")?.unwrap_or_default();
        if reply == "ERROR" {
            return Err(ModemError::NotRegistered(
                "operator query answered ERROR".to_string(),
            ));
        }
        Ok(reply_field(&reply, "+COPS", 2))
    }

    fn get_service_provider(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+CSPN?")?.unwrap_or_default();
        if reply == "ERROR" {
            return Err(ModemError::SimUnavailable(
                "service provider query answered ERROR".to_string(),
            ));
        }
        Ok(reply_field(&reply, "+CSPN", 0))
    }

    fn get_signal_strength(&mut self) -> ModemResult<Option<f64>> {
        let reply = self.command("AT+CSQ")?.unwrap_or_default();
        let Some(code) = reply_field(&reply, "+CSQ", 0).and_then(|f| f.parse::<u8>().ok()) else {
            debug!("Unexpected reply to AT+CSQ: {}", reply);
            return Ok(None);
        };

        if code == 99 {
            return Ok(Some(0.0));
        }
        Ok(Some((f64::from(code) + 1.0) / 0.32))
    }

    fn get_battery_voltage(&mut self) -> ModemResult<Option<f64>> {
        let reply = self.command("AT+CBC")?.unwrap_or_default();
        Ok(reply_field(&reply, "+CBC", 2)
            .and_then(|millivolts| millivolts.parse::<f64>().ok())
            .map(|millivolts| millivolts / 1000.0))
    }

    fn get_msisdn(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+CNUM")?.unwrap_or_default();
        if reply == "OK" {
            debug!("SIM does not store its own number");
            return Ok(None);
        }
        Ok(reply_field(&reply, "+CNUM", 1).filter(|number| !number.is_empty()))
    }

    fn get_imsi(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+CIMI")?;
        Ok(plain_reply("AT+CIMI", reply))
    }

    fn get_ccid(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+CCID")?;
        Ok(plain_reply("AT+CCID", reply))
    }

    fn get_unit_name(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("ATI")?;
        Ok(plain_reply("ATI", reply))
    }

    fn get_serial_number(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+CGSN")?;
        Ok(plain_reply("AT+CGSN", reply))
    }

    fn get_hw_revision(&mut self) -> ModemResult<Option<String>> {
        let reply = self.command("AT+CGMR")?;
        Ok(plain_reply("AT+CGMR", reply)
            .map(|revision| revision.trim_start_matches("Revision:").to_string()))
    }

    fn get_temperature(&mut self) -> ModemResult<Option<f64>> {
        let reply = self.command("AT+CMTE?")?.unwrap_or_default();
        Ok(reply_field(&reply, "+CMTE", 1).and_then(|celsius| celsius.parse().ok()))
    }

    fn set_charset_hex(&mut self) -> ModemResult<bool> {
        let timeout = self.config.command_timeout;
        Ok(self.command_ok("AT+CSCS=\"HEX\"", Accept::ok(), timeout)?.is_ok())
    }

    fn set_charset_ira(&mut self) -> ModemResult<bool> {
        let timeout = self.config.command_timeout;
        Ok(self.command_ok("AT+CSCS=\"IRA\"", Accept::ok(), timeout)?.is_ok())
    }
}

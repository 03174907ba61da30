// ABOUTME: Text-mode SMS workflows for the default client
// ABOUTME: Sending, reading by index, deleting and draining the inbox one message at a time

use crate::client::default::Sim800;
use crate::client::error::{ModemError, ModemResult};
use crate::client::poll::Clock;
use crate::client::traits::{AtSession, SmsClient};
use crate::connection::Transport;
use crate::datatypes::{
    AtCommand, ExpectedLines, ListEntry, MessageFilter, SmsRecord, SmsSendStatus,
};
use tracing::{debug, error, info};

impl<T: Transport, C: Clock + Clone> SmsClient for Sim800<T, C> {
    fn send_sms(&mut self, destination: &str, text: &str) -> ModemResult<SmsSendStatus> {
        if destination.is_empty() || destination.contains(['"', '\r', '\n']) {
            return Err(ModemError::InvalidData(format!(
                "Invalid destination number: {:?}",
                destination
            )));
        }

        let command = AtCommand::new(format!("AT+CMGS=\"{}\"", destination))
            .payload(text)
            .lines(ExpectedLines::Multi(self.config.sms_lines))
            .wait(self.config.sms_wait);
        let prompt = self.transact(&command)?;

        let prompted = prompt.as_deref().is_some_and(|line| line.starts_with('>'));
        let confirmed = ["+CUSD", "+CMGS"]
            .iter()
            .any(|tag| self.saved_buffer().starts_with(tag));

        if prompted && confirmed {
            info!("SMS to {} accepted: {}", destination, self.saved_buffer());
            Ok(SmsSendStatus::Ok)
        } else {
            error!(
                "SMS to {} failed (prompt {:?}, reply {:?})",
                destination,
                prompt,
                self.saved_buffer()
            );
            Ok(SmsSendStatus::Error)
        }
    }

    fn read_sms(&mut self, index: u32) -> ModemResult<Option<SmsRecord>> {
        let command = AtCommand::new(format!("AT+CMGR={}", index))
            .lines(ExpectedLines::Multi(self.config.sms_lines));
        let Some(header) = self.transact(&command)? else {
            debug!("No reply reading message {}", index);
            return Ok(None);
        };

        let record = SmsRecord::from_header(&header, self.saved_buffer());
        if record.is_none() {
            debug!("Unexpected reply reading message {}: {}", index, header);
        }
        Ok(record)
    }

    fn delete_sms(&mut self, index: u32) -> ModemResult<()> {
        let command = AtCommand::new(format!("AT+CMGD={}", index)).lines(ExpectedLines::None);
        self.transact(&command)?;
        Ok(())
    }

    fn read_and_delete_all(&mut self, index: u32) -> ModemResult<Option<SmsRecord>> {
        let record = if index > 0 {
            self.read_sms(index)
        } else {
            Ok(None)
        };

        let delete_all = AtCommand::new("AT+CMGDA=\"DEL ALL\"").lines(ExpectedLines::None);
        self.transact(&delete_all)?;

        record
    }

    fn read_next_message(&mut self, filter: MessageFilter) -> ModemResult<Option<SmsRecord>> {
        let listing = self.command(&format!("AT+CMGL=\"{}\"", filter.as_str()))?;
        let line = match listing.as_deref() {
            None | Some("OK") => return Ok(None),
            Some(line) => line,
        };

        match ListEntry::parse(line) {
            Some(ListEntry::Stored(index)) => {
                debug!("Purging stored message {}", index);
                self.delete_sms(index)?;
                Ok(None)
            }
            Some(ListEntry::Received(index)) => {
                let record = self.read_sms(index)?;
                self.delete_sms(index)?;
                Ok(record)
            }
            None => {
                debug!("Unparseable message listing: {}", line);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::ModemConfig;
    use crate::test_support::{ManualClock, ScriptedTransport};

    fn modem(transport: ScriptedTransport) -> Sim800<ScriptedTransport, ManualClock> {
        Sim800::with_clock(transport, ModemConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_send_writes_body_after_command() {
        let transport = ScriptedTransport::new().on("AT+CMGS", "\r\n> \r\n+CMGS: 4\r\n\r\nOK\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.send_sms("+39123", "ciao").unwrap(), SmsSendStatus::Ok);
        assert_eq!(
            modem.transport.written(),
            b"AT+CMGS=\"+39123\"\nciao\x1a".as_slice()
        );
    }

    #[test]
    fn test_send_accepts_ussd_reply() {
        let transport =
            ScriptedTransport::new().on("AT+CMGS", "> \r\n+CUSD: 0,\"Credit 5.00\",15\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.send_sms("*123#", "").unwrap(), SmsSendStatus::Ok);
    }

    #[test]
    fn test_send_without_prompt_fails() {
        let transport = ScriptedTransport::new().on("AT+CMGS", "ERROR\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.send_sms("+39123", "ciao").unwrap(), SmsSendStatus::Error);
    }

    #[test]
    fn test_send_rejects_bad_destination() {
        let mut modem = modem(ScriptedTransport::new());

        assert!(matches!(
            modem.send_sms("+39\"1", "x"),
            Err(ModemError::InvalidData(_))
        ));
        assert!(modem.transport.written().is_empty());
    }

    #[test]
    fn test_read_sms_wrong_tag() {
        let transport = ScriptedTransport::new().on("AT+CMGR=9", "\r\nERROR\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.read_sms(9).unwrap(), None);
    }

    #[test]
    fn test_read_and_delete_all_deletes_after_failed_read() {
        let transport = ScriptedTransport::new().on("AT+CMGR=2", "\r\nERROR\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.read_and_delete_all(2).unwrap(), None);
        assert!(modem.transport.written_text().ends_with("AT+CMGDA=\"DEL ALL\"\n"));
    }

    #[test]
    fn test_read_and_delete_all_skips_read_without_index() {
        let mut modem = modem(ScriptedTransport::new());

        assert_eq!(modem.read_and_delete_all(0).unwrap(), None);
        assert_eq!(modem.transport.written_text(), "AT+CMGDA=\"DEL ALL\"\n");
    }

    #[test]
    fn test_read_next_message_empty_inbox() {
        let transport = ScriptedTransport::new().on("AT+CMGL", "\r\nOK\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.read_next_message(MessageFilter::All).unwrap(), None);
        assert_eq!(modem.transport.written_text(), "AT+CMGL=\"ALL\"\n");
    }

    #[test]
    fn test_read_next_message_unparseable_listing() {
        let transport = ScriptedTransport::new().on("AT+CMGL", "+CMGL: x,\"REC UNREAD\"\r\n");
        let mut modem = modem(transport);

        assert_eq!(modem.read_next_message(MessageFilter::Unread).unwrap(), None);
        assert!(!modem.transport.written_text().contains("AT+CMGD"));
    }
}

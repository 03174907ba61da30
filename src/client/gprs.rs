// ABOUTME: GPRS bearer handling and the phased HTTP exchange for the default client
// ABOUTME: Every failed HTTP phase tears down the HTTP service and, unless kept, the bearer

use crate::client::default::Sim800;
use crate::client::error::ModemResult;
use crate::client::poll::Clock;
use crate::client::traits::{AtSession, GprsClient};
use crate::client::types::HttpRequest;
use crate::connection::Transport;
use crate::datatypes::{Accept, BearerStatus, Confirmation, HttpMethod, HttpOutcome, Notification};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const READ_CHUNK: usize = 1024;

impl<T: Transport, C: Clock + Clone> GprsClient for Sim800<T, C> {
    fn get_ip(&mut self) -> ModemResult<BearerStatus> {
        let reply = self.command("AT+SAPBR=2,1")?.unwrap_or_default();
        Ok(BearerStatus::parse(&reply))
    }

    fn connect_gprs(&mut self, apn: &str) -> ModemResult<Option<Ipv4Addr>> {
        if let Some(ip) = self.get_ip()?.ip() {
            debug!("Bearer already bound to {}", ip);
            return Ok(Some(ip));
        }

        let open = format!(
            "AT+SAPBR=3,1,\"CONTYPE\",\"GPRS\";+SAPBR=3,1,\"APN\",\"{}\";+SAPBR=1,1",
            apn
        );
        let timeout = self.config.command_timeout;
        if self.command_ok(&open, Accept::ok().with_error(), timeout)? == Confirmation::Error {
            error!("Modem refused to open a bearer on {}", apn);
            return Ok(None);
        }

        let ip = self.get_ip()?.ip();
        match ip {
            Some(ip) => info!("GPRS connected on {} with address {}", apn, ip),
            None => error!("No address bound after opening a bearer on {}", apn),
        }
        Ok(ip)
    }

    fn disconnect_gprs(&mut self) -> ModemResult<bool> {
        let timeout = self.config.command_timeout;
        Ok(self.command_ok("AT+SAPBR=0,1", Accept::ok(), timeout)?.is_ok())
    }

    fn http(&mut self, request: &HttpRequest) -> ModemResult<Option<String>> {
        let body = self.http_exchange(request);
        let teardown = self.http_teardown(request.keep_session);
        match (&body, teardown) {
            (Err(_), Err(e)) => warn!("HTTP teardown after a failed exchange also failed: {}", e),
            (Ok(_), Err(e)) => return Err(e),
            (_, Ok(())) => {}
        }
        body
    }
}

impl<T: Transport, C: Clock + Clone> Sim800<T, C> {
    fn http_exchange(&mut self, request: &HttpRequest) -> ModemResult<Option<String>> {
        let timeout = request.timeout.unwrap_or(self.config.http_timeout);

        if self.connect_gprs(&request.apn)?.is_none() {
            return Ok(None);
        }

        if !self.http_init(request)? {
            debug!("HTTP initialization failed, retrying once");
            self.command_ok("AT+HTTPTERM", Accept::ok().with_error(), self.config.command_timeout)?;
            if !self.http_init(request)? {
                error!("Unable to initialize HTTP for {}", request.url);
                return Ok(None);
            }
        }

        if request.method == HttpMethod::Put && !self.http_upload(request, timeout)? {
            return Ok(None);
        }

        let action = format!("AT+HTTPACTION={}", request.method.action_code());
        if !self
            .command_ok(&action, Accept::ok(), self.config.command_timeout)?
            .is_ok()
        {
            error!("HTTP {} of {} was not started", request.method, request.url);
            return Ok(None);
        }

        let Some(length) = self.http_await_action(request.method, timeout)? else {
            return Ok(None);
        };

        self.http_read(length, timeout)
    }

    fn http_init(&mut self, request: &HttpRequest) -> ModemResult<bool> {
        let mut init = format!(
            "AT+HTTPINIT;+HTTPPARA=\"CID\",1;+HTTPPARA=\"URL\",\"{}\"",
            request.url
        );
        if request.method == HttpMethod::Put {
            init.push_str(&format!(";+HTTPPARA=\"CONTENT\",\"{}\"", request.content_type));
        }
        if let Some(user_agent) = &request.user_agent {
            init.push_str(&format!(";+HTTPPARA=\"UA\",\"{}\"", user_agent));
        }
        if request.allow_redirection {
            init.push_str(";+HTTPPARA=\"REDIR\",1");
        }
        init.push_str(if request.use_ssl {
            ";+HTTPSSL=1"
        } else {
            ";+HTTPSSL=0"
        });

        let timeout = self.config.command_timeout;
        Ok(self.command_ok(&init, Accept::ok(), timeout)?.is_ok())
    }

    fn http_upload(&mut self, request: &HttpRequest, timeout: Duration) -> ModemResult<bool> {
        let Some(data) = request.data.as_deref().filter(|data| !data.is_empty()) else {
            error!("HTTP PUT of {} has no data", request.url);
            return Ok(false);
        };

        let announce = format!(
            "AT+HTTPDATA={},{}",
            data.len(),
            self.config.http_data_timeout.as_millis()
        );
        let accept = Accept::ok().with_download().with_error();
        let confirmation = self.command_ok(&announce, accept, self.config.command_timeout)?;
        if confirmation != Confirmation::Download {
            error!("Modem did not accept HTTP data for {}: {:?}", request.url, confirmation);
            return Ok(false);
        }

        self.transport.write_all(data.as_bytes())?;

        let stored = self.poll(timeout, |session| {
            Ok(session.check_incoming()?.is_ok().then_some(()))
        })?;
        if stored.is_none() {
            error!("Timed out uploading HTTP data for {}", request.url);
            return Ok(false);
        }
        Ok(true)
    }

    fn http_await_action(
        &mut self,
        method: HttpMethod,
        timeout: Duration,
    ) -> ModemResult<Option<usize>> {
        let outcome = self.poll(timeout, |session| {
            Ok(match session.check_incoming()? {
                Notification::HttpActionResult {
                    method: reported,
                    outcome,
                } if reported == method => Some(outcome),
                _ => None,
            })
        })?;

        match outcome {
            Some(HttpOutcome::Success { status, length }) => {
                debug!("HTTP {} answered {} with {} bytes", method, status, length);
                Ok(Some(length))
            }
            Some(HttpOutcome::Failure { status }) => {
                error!("HTTP {} failed with status {}", method, status);
                Ok(None)
            }
            None => {
                error!("Timed out waiting for HTTP {} result", method);
                Ok(None)
            }
        }
    }

    fn http_read(&mut self, action_length: usize, timeout: Duration) -> ModemResult<Option<String>> {
        let reply = self.command("AT+HTTPREAD")?.unwrap_or_default();
        let Some(length) = reply
            .strip_prefix("+HTTPREAD:")
            .and_then(|count| count.trim().parse::<usize>().ok())
        else {
            error!("Unexpected reply to AT+HTTPREAD: {}", reply);
            return Ok(None);
        };
        if length != action_length {
            warn!(
                "HTTPREAD reports {} bytes but the action announced {}",
                length, action_length
            );
        }

        if length > self.config.http_max_body {
            debug!(
                "HTTPREAD length {} exceeds the {} byte limit",
                length, self.config.http_max_body
            );
            return Ok(None);
        }

        // Grown as bytes arrive rather than sized from the reported count
        let mut body = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        let interval = self.config.poll_interval;
        self.poll(timeout, |session| {
            while body.len() < length {
                let wanted = (length - body.len()).min(chunk.len());
                let read = session.transport.read(&mut chunk[..wanted], interval)?;
                if read == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..read]);
            }
            Ok((body.len() >= length).then_some(()))
        })?;
        if body.len() < length {
            warn!("HTTP body truncated: {} of {} bytes received", body.len(), length);
        }

        strip_trailing_ok(&mut body);
        Ok(Some(String::from_utf8_lossy(&body).into_owned()))
    }

    fn http_teardown(&mut self, keep_session: bool) -> ModemResult<()> {
        let timeout = self.config.command_timeout;
        self.command_ok("AT+HTTPTERM", Accept::ok().with_error(), timeout)?;
        if !keep_session && !self.disconnect_gprs()? {
            warn!("Bearer was not closed after HTTP exchange");
        }
        Ok(())
    }
}

/// Drop an `OK` acknowledgement that ended up at the tail of a payload
fn strip_trailing_ok(body: &mut Vec<u8>) {
    for tail in [b"\r\nOK\r\n".as_slice(), b"\r\nOK".as_slice()] {
        if body.ends_with(tail) {
            body.truncate(body.len() - tail.len());
            return;
        }
    }
}

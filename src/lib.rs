pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;

#[cfg(test)]
mod test_support;


// Re-export codec types for direct access
pub use codec::{CodecError, decode, encode};

// Re-export the transport layer
pub use connection::{TcpTransport, Transport};

// Re-export the main client API for easy access
pub use client::{
    AtSession, ClientBuilder, DeviceInfo, GprsClient, HttpRequest, ModemConfig, ModemError,
    ModemResult, NetworkTime, NtpRequest, Sim800, SmsClient,
};

/// A specialized `Result` type for modem operations.
///
/// This is defined as a convenience.
///
/// # Examples
///
/// ## Sending an SMS
///
/// This example shows the simplest way to send an SMS through a modem that
/// sits behind a serial-to-TCP bridge:
///
/// ```rust,no_run
/// use sim800::client::{ClientBuilder, ModemConfig, SmsClient};
/// use sim800::datatypes::SmsSendStatus;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Connect and run the initial AT setup sequence
///     let mut modem = ClientBuilder::connect("localhost:7000", ModemConfig::default())?;
///
///     // Send the message and check the modem's confirmation
///     match modem.send_sms("+391234567890", "Hello, World!")? {
///         SmsSendStatus::Ok => println!("Message sent"),
///         SmsSendStatus::Error => println!("Modem refused the message"),
///     }
///
///     Ok(())
/// }
/// ```
///
/// ## HTTP over GPRS
///
/// ```rust,no_run
/// use sim800::client::{ClientBuilder, GprsClient, HttpRequest, ModemConfig};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut modem = ClientBuilder::connect("localhost:7000", ModemConfig::default())?;
///
///     let request = HttpRequest::get("http://example.com/status")
///         .apn("internet")
///         .build()?;
///
///     if let Some(body) = modem.http(&request)? {
///         println!("{body}");
///     }
///
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ModemError>;

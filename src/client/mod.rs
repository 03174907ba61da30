// ABOUTME: SIM800 client module providing trait-based interfaces over the AT command channel
// ABOUTME: Exports all client components including traits, builders, error types, and default implementation

//! SIM800 Client Module
//!
//! This module provides a trait-based driver for SIM800 modems with the following features:
//!
//! * **Blocking, bounded waits** - Every wait has a deadline taken from an injectable [`Clock`]
//! * **Layered design** - Separate traits for the raw AT session and for each service on top
//! * **Typed replies** - Modem answers surface as enums (`Confirmation`, `BearerStatus`, ...)
//! * **Builder patterns** - Easy client and request creation with sensible defaults
//! * **Extensible** - Implement the traits over any [`Transport`](crate::Transport)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sim800::client::{ClientBuilder, DeviceInfo, ModemConfig, SmsClient};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut modem = ClientBuilder::connect("localhost:7000", ModemConfig::default())?;
//!
//! if modem.is_registered()? {
//!     modem.send_sms("+391234567890", "Hello!")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Draining the Inbox
//!
//! ```rust,no_run
//! use sim800::client::{ClientBuilder, ModemConfig, SmsClient};
//! use sim800::datatypes::MessageFilter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut modem = ClientBuilder::connect("localhost:7000", ModemConfig::default())?;
//!
//! while let Some(message) = modem.read_next_message(MessageFilter::All)? {
//!     println!("{} {} {}: {}", message.sender, message.date, message.time, message.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The client module uses a layered trait design:
//!
//! * `AtSession` - Transactions, notification classification and confirmed commands
//! * `SmsClient` - Text-mode SMS operations (extends AtSession)
//! * `GprsClient` - Bearer management and HTTP (extends AtSession)
//! * `DeviceInfo` - Setup, reset, clock and identity queries (extends AtSession)
//! * `NetworkTime` - NTP sync (extends GprsClient + DeviceInfo)

pub mod builder;
pub mod default;
mod device;
pub mod error;
mod gprs;
mod ntp;
pub mod poll;
mod sms;
pub mod traits;
pub mod types;

// Re-export the main types for easy access
pub use builder::ClientBuilder;
pub use default::Sim800;
pub use error::{ModemError, ModemResult};
pub use poll::{Clock, PollPolicy, SystemClock};
pub use traits::{AtSession, DeviceInfo, GprsClient, NetworkTime, SmsClient};
pub use types::{HttpRequest, HttpRequestBuilder, ModemConfig, NtpRequest};

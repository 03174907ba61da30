// ABOUTME: Example application that reads and deletes every message in the SIM inbox
// ABOUTME: Demonstrates read_next_message and the incoming-message callback

use argh::FromArgs;
use sim800::client::{AtSession, ClientBuilder, ModemConfig, SmsClient};
use sim800::datatypes::{MessageFilter, Notification};
use std::error::Error;
use std::thread;
use std::time::Duration;

/// Drain the SIM inbox, then keep printing messages as they arrive
#[derive(FromArgs)]
struct CliArgs {
    /// address of the serial bridge (default: localhost:7000)
    #[argh(option, default = "String::from(\"localhost:7000\")")]
    bridge: String,

    /// include messages that were already read
    #[argh(switch, short = 'a')]
    all: bool,

    /// keep watching for new messages after draining
    #[argh(switch, short = 'w')]
    watch: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli_args: CliArgs = argh::from_env();
    let filter = if cli_args.all {
        MessageFilter::All
    } else {
        MessageFilter::Unread
    };

    let mut modem = ClientBuilder::connect(&cli_args.bridge, ModemConfig::default())?;
    modem.on_incoming_message(|index| println!("New message stored at {index}"));

    while let Some(message) = modem.read_next_message(filter)? {
        println!("[{} {}] {}: {}", message.date, message.time, message.sender, message.text);
    }

    if !cli_args.watch {
        return Ok(());
    }

    loop {
        if let Notification::IncomingMessage(index) = modem.check_incoming()? {
            if let Some(message) = modem.read_sms(index)? {
                println!("[{} {}] {}: {}", message.date, message.time, message.sender, message.text);
                modem.delete_sms(index)?;
            }
        }
        thread::sleep(Duration::from_millis(500));
    }
}

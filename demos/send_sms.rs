// ABOUTME: Example application demonstrating SMS sending through a SIM800 behind a serial bridge
// ABOUTME: Shows ClientBuilder::connect plus the registration check before sending

use argh::FromArgs;
use sim800::client::{ClientBuilder, DeviceInfo, ModemConfig, SmsClient};
use sim800::datatypes::SmsSendStatus;
use std::error::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Example application to show the simplest case of sending an SMS message
#[derive(FromArgs)]
struct CliArgs {
    /// log the raw AT traffic
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the hostname or IP address of the serial bridge (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port of the serial bridge (default: 7000)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging {
        Level::TRACE
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(7000);

    let mut modem = ClientBuilder::connect(format!("{host}:{port}"), ModemConfig::default())?;

    if !modem.is_registered()? {
        eprintln!("Modem is not registered with a network");
        return Ok(());
    }

    match modem.send_sms(&cli_args.to, &cli_args.message)? {
        SmsSendStatus::Ok => println!("Message sent to {}", cli_args.to),
        SmsSendStatus::Error => eprintln!("Modem refused the message"),
    }

    Ok(())
}

// ABOUTME: Example application fetching a URL over GPRS with the modem's HTTP stack
// ABOUTME: Also prints the signal quality and the operator before the request

use argh::FromArgs;
use sim800::client::{ClientBuilder, DeviceInfo, GprsClient, HttpRequest, ModemConfig};
use std::error::Error;
use std::time::Duration;

/// Fetch a URL through a SIM800
#[derive(FromArgs)]
struct CliArgs {
    /// address of the serial bridge (default: localhost:7000)
    #[argh(option, default = "String::from(\"localhost:7000\")")]
    bridge: String,

    /// access point name
    #[argh(option, short = 'a')]
    apn: String,

    /// request timeout in seconds (default: 30)
    #[argh(option, default = "30")]
    timeout: u64,

    /// leave the GPRS bearer open afterwards
    #[argh(switch)]
    keep_session: bool,

    /// the URL to fetch
    #[argh(positional)]
    url: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli_args: CliArgs = argh::from_env();
    let mut modem = ClientBuilder::connect(&cli_args.bridge, ModemConfig::default())?;

    println!("Operator: {:?}", modem.get_operator()?);
    println!("Signal:   {:?}", modem.get_signal_strength()?);

    let mut request = HttpRequest::get(cli_args.url)
        .apn(cli_args.apn)
        .timeout(Duration::from_secs(cli_args.timeout));
    if cli_args.keep_session {
        request = request.keep_session();
    }

    match modem.http(&request.build()?)? {
        Some(body) => println!("{body}"),
        None => eprintln!("Request failed"),
    }

    Ok(())
}

//! Send one pulse setup command to a serial peer and print its reply.
//!
//! Run with:
//!   cargo run --example pulse-setup -- /dev/ttyUSB0 [pulse_hz] [pulse_limit] [delay_us]
//!
//! All-zero arguments (the default) stop the pulse train.
//! Set `SERIALPEER_LOG=debug` to see every frame as hex on stderr.

use std::str::FromStr;

use serialpeer::frame::{build, hex_dump, SetupCommand, SETUP};
use serialpeer::session::{ExchangeConfig, Session, SessionConfig};
use serialpeer::transport::DEFAULT_BAUD_RATE;

fn init_logging() {
    let level = std::env::var("SERIALPEER_LOG")
        .ok()
        .and_then(|value| tracing::Level::from_str(&value).ok())
        .unwrap_or(tracing::Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let setup = SetupCommand {
        pulse_hz: args.next().map(|v| v.parse()).transpose()?.unwrap_or(0),
        pulse_limit: args.next().map(|v| v.parse()).transpose()?.unwrap_or(0),
        delay_us: args.next().map(|v| v.parse()).transpose()?.unwrap_or(0),
    };

    let payload = setup.to_payload();
    println!("{:<30}{}", "frame:", hex_dump(&build(SETUP, &payload)?));
    println!("{:<30}{}", "wire:", hex_dump(&setup.to_frame().to_wire()?));

    let config = SessionConfig {
        baud_rate: DEFAULT_BAUD_RATE,
        ..SessionConfig::default()
    };
    let mut session = Session::open_with_config(&path, config)?;

    let reply = session.exchange(SETUP, &payload, &ExchangeConfig::default())?;
    println!("{:<30}{:#04X}", "reply command:", reply.command_id);
    println!("{:<30}{}", "reply payload:", hex_dump(&reply.payload));
    println!("{:<30}{}", "reply text:", reply.payload_text());

    session.close();
    Ok(())
}

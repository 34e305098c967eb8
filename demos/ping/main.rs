use std::time::Duration;

use echo_fox::{AttemptOutcome, GenericError, PingConfig, PingSession};

#[derive(argh::FromArgs)]
/// ping - send ICMP ECHO_REQUEST over a raw socket (needs root)
struct Args {
    #[argh(option, short = 'c', default = "10")]
    /// stop after <count> sent ping messages
    count: u32,

    #[argh(option, short = 'W', default = "1.0")]
    /// seconds to wait for each reply
    timeout: f64,

    #[argh(option, short = 'i', default = "1.0")]
    /// seconds to pause after each ping
    interval: f64,

    #[argh(switch, short = 'v')]
    /// log every packet
    verbose: bool,

    #[argh(positional)]
    /// host name or IPv4 address
    host: String,
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();

    let level = if args.verbose { tracing::Level::TRACE } else { tracing::Level::WARN };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = PingConfig {
        timeout: Duration::try_from_secs_f64(args.timeout)?,
        count: args.count,
        interval: Duration::try_from_secs_f64(args.interval)?,
        ..PingConfig::default()
    };
    let target = echo_fox::lookup_host_v4(&args.host)?;
    println!("Pinging {target} using Rust:\n");

    let session = PingSession::raw(config);
    let report = session.run_with(&target.to_string(), |_, outcome| match outcome {
        AttemptOutcome::Delay(_) => println!("Reply from {target}: {outcome}"),
        AttemptOutcome::Error(_) => println!("Error from {target}: {outcome}"),
        AttemptOutcome::Timeout => println!("{outcome}"),
    })?;

    println!("\n{report}");
    Ok(())
}

use std::time::Duration;

use eyre::{
    Result,
    WrapErr,
};
use structopt::StructOpt as _;
use tokio::io::{
    AsyncBufReadExt,
    BufReader,
    ReadHalf,
    WriteHalf,
};
use tokio_serial::SerialStream;

use runtime::{
    Endpoint,
    Health,
    SerialModem,
    Transport,
};
use util::{
    bootstrap,
    trace_catch,
};

pub use crate::options::{
    Command,
    Options,
};

mod options;
mod trace;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap!("starting {}", util::build_info());

    let options: Options = Options::from_args();

    trace::init(options.pretty);

    tracing::info!(
        application = util::PACKAGE,
        version = util::VERSION,
        build_commit = util::COMMIT_HASH,
        built_at = util::BUILD_TIMESTAMP,
        using_rustc = util::RUSTC_COMMIT_HASH,
        "tracing subsystem initialized"
    );

    let config = options.link_config()?;
    tracing::debug!(?config, "link configuration");

    let (read, write) = connect_serial(&options.serial_port, options.baud)?;
    let mut endpoint = Endpoint::new(SerialModem::new(read, write), config);

    let result = run(&mut endpoint, &options.command).await;

    let stats = serde_json::to_string(&endpoint.stats());
    trace_catch!(stats, "serializing link statistics");

    if let Ok(stats) = stats {
        tracing::info!(%stats, health = ?endpoint.health(), "link statistics");
    }

    result
}

fn connect_serial(port: &str, baud: u32) -> Result<(ReadHalf<SerialStream>, WriteHalf<SerialStream>)> {
    let builder = tokio_serial::new(port, baud);
    let stream = SerialStream::open(&builder).wrap_err_with(|| format!("opening serial port {}", port))?;

    tracing::info!(port, baud, "serial port open");

    Ok(tokio::io::split(stream))
}

async fn run<T>(endpoint: &mut Endpoint<T>, command: &Command) -> Result<()>
where
    T: Transport,
{
    match command {
        Command::Init => {
            initialize(endpoint).await?;

            match endpoint.firmware_version().await? {
                Some(version) => println!("{}", version),
                None => tracing::warn!("modem did not report a firmware version"),
            }
        },

        Command::Send {
            no_ack,
            messages,
        } => {
            initialize(endpoint).await?;

            let mut undelivered = 0usize;

            if messages.is_empty() {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();

                while let Some(line) = lines.next_line().await? {
                    if !send(endpoint, &line, !no_ack).await? {
                        undelivered += 1;
                    }
                }
            } else {
                for message in messages {
                    if !send(endpoint, message, !no_ack).await? {
                        undelivered += 1;
                    }
                }
            }

            if undelivered > 0 {
                eyre::bail!("{} message(s) not delivered", undelivered);
            }
        },

        Command::Receive {
            timeout_secs,
            count,
        } => {
            initialize(endpoint).await?;

            let timeout = Duration::from_secs(*timeout_secs);
            let mut delivered = 0usize;

            while count.map_or(true, |count| delivered < count) {
                let payload = tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("interrupted");
                        break;
                    },
                    payload = endpoint.receive_packet(timeout) => payload?,
                };

                match payload {
                    Some(payload) => {
                        println!("{}", payload);
                        delivered += 1;
                    },
                    None => check_health(endpoint).await?,
                }
            }
        },

        Command::Recover => {
            if !endpoint.recover().await? {
                eyre::bail!("modem did not come back after recovery");
            }
        },
    }

    Ok(())
}

async fn initialize<T>(endpoint: &mut Endpoint<T>) -> Result<()>
where
    T: Transport,
{
    if !endpoint.initialize().await? {
        eyre::bail!("modem initialization failed");
    }

    Ok(())
}

async fn send<T>(endpoint: &mut Endpoint<T>, message: &str, require_ack: bool) -> Result<bool>
where
    T: Transport,
{
    match endpoint.send_packet(message, require_ack).await {
        Ok(true) => Ok(true),
        Ok(false) => {
            tracing::warn!(message, "not delivered");
            Ok(false)
        },
        Err(e) if !e.is_fatal() => {
            tracing::error!(error = %e, "message rejected");
            Ok(false)
        },
        Err(e) => Err(e.into()),
    }
}

/// Between idle receive windows: recover the modem if the link has degraded.
/// A quiet link only needs the modem to answer `AT`.
async fn check_health<T>(endpoint: &mut Endpoint<T>) -> Result<()>
where
    T: Transport,
{
    let reason = match endpoint.health() {
        Health::Healthy => return Ok(()),
        Health::Degraded(reason) => reason,
    };

    if endpoint.ping().await? && endpoint.health().is_healthy() {
        tracing::debug!(%reason, "modem still answering");
        return Ok(());
    }

    tracing::warn!(%reason, "link degraded, recovering");

    if !endpoint.recover().await? {
        tracing::error!("recovery did not restore the modem");
    }

    Ok(())
}

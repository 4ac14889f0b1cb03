use std::path::PathBuf;

use eyre::WrapErr;

use message::{
    Address,
    RfParameters,
};
use runtime::LinkConfig;

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
#[structopt(about = "Reliable packet link over a LoRa AT-command modem")]
pub struct Options {
    #[structopt(short, long)]
    pub serial_port: String,

    #[structopt(short, long, default_value = "115200")]
    pub baud: u32,

    /// JSON link configuration; flags below override it.
    #[structopt(long)]
    pub config: Option<PathBuf>,

    #[structopt(long)]
    pub pretty: bool,

    #[structopt(long)]
    pub address: Option<Address>,

    #[structopt(long)]
    pub peer: Option<Address>,

    #[structopt(long)]
    pub network_id: Option<u8>,

    #[structopt(long)]
    pub band: Option<u32>,

    /// Spreading factor, bandwidth, coding rate, preamble: e.g. `9,7,1,12`.
    #[structopt(long)]
    pub parameters: Option<RfParameters>,

    #[structopt(long)]
    pub factory_reset: bool,

    /// Accept packets and acknowledgments from nodes other than the peer.
    #[structopt(long)]
    pub accept_foreign: bool,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub enum Command {
    /// Configure the modem and print its firmware version.
    Init,

    /// Send each message, or each line of stdin when none are given.
    Send {
        #[structopt(long)]
        no_ack: bool,

        messages: Vec<String>,
    },

    /// Print delivered payloads until interrupted.
    Receive {
        #[structopt(long, default_value = "10")]
        timeout_secs: u64,

        #[structopt(long)]
        count: Option<usize>,
    },

    /// Factory-reset, restart and reconfigure the modem.
    Recover,
}

impl Options {
    pub fn link_config(&self) -> eyre::Result<LinkConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("reading {}", path.display()))?;

                LinkConfig::from_json(&text).wrap_err("parsing link configuration")?
            },
            None => LinkConfig::default(),
        };

        if let Some(address) = self.address {
            config.address = address;
        }

        if let Some(peer) = self.peer {
            config.peer = peer;
        }

        if let Some(network_id) = self.network_id {
            config.network_id = network_id;
        }

        if let Some(band) = self.band {
            config.band = band;
        }

        if let Some(parameters) = self.parameters {
            config.parameters = parameters;
        }

        config.factory_reset |= self.factory_reset;
        config.filter_foreign &= !self.accept_foreign;

        Ok(config)
    }
}

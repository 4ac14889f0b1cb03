use std::time::Duration;

use message::{
    reply,
    Address,
    Command,
    DecodeError,
    Notification,
    Packet,
    Reply,
    Seq,
    MAX_PAYLOAD_LEN,
};
use tokio::time::Instant;
use tokio_retry::strategy::FixedInterval;

use crate::{
    ack,
    config::LinkConfig,
    health::{
        Fault,
        Health,
        HealthMonitor,
        Operation,
    },
    stats::LinkStats,
    transport::{
        self,
        Transport,
    },
    Error,
};

/// Backoff when a transport hands back nothing before the deadline.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Settling time after `AT+FACTORY` and `AT+RESET`.
pub const RESET_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, derive_more::Display)]
pub enum SendState {
    Idle,
    Sending,
    Sent,
    AwaitingAck,
    Acked,
    RetryWait,
    Exhausted,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, derive_more::Display)]
pub enum ReceiveState {
    Idle,
    Listening,
    Validating,
    Acking,
    Delivering,
    Discarding,
}

#[inline]
fn transition(state: impl std::fmt::Display) {
    tracing::trace!(new_state = %state, "state machine transition");
}

/// What an inbound line turned out to be once checked.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Inbound {
    Fresh { source: Address, packet: Packet },
    Duplicate { source: Address, seq: Seq },
    Discard,
}

/// One side of the link: reliable send with acknowledgment and retry, and
/// receive with validation, acknowledgment and duplicate suppression.
///
/// All operations take `&mut self`; there is one logical task per endpoint.
pub struct Endpoint<T> {
    transport:     T,
    config:        LinkConfig,
    send_seq:      Seq,
    last_received: Option<Seq>,

    health:           HealthMonitor,
    pub(crate) stats: LinkStats,
}

impl<T> Endpoint<T>
where
    T: Transport,
{
    pub fn new(transport: T, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            send_seq: 0,
            last_received: None,
            health: HealthMonitor::new(),
            stats: LinkStats::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    #[inline]
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Sequence number of the most recent outbound packet; 0 before the first.
    #[inline]
    pub fn send_seq(&self) -> Seq {
        self.send_seq
    }

    #[inline]
    pub fn last_received(&self) -> Option<Seq> {
        self.last_received
    }

    #[inline]
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    #[inline]
    pub fn health_monitor(&self) -> &HealthMonitor {
        &self.health
    }

    #[inline]
    pub fn health(&self) -> Health {
        self.health.check()
    }

    /// Issue one command. Transient transport errors count as no response.
    pub(crate) async fn command(&mut self, command: &Command, wait: Duration) -> Result<Option<String>, Error> {
        let line = command.to_string();
        tracing::trace!(%line, "-> modem");

        let response = match self.transport.send_command(&line, wait).await {
            Ok(response) => {
                self.health.reset(Fault::Transport);
                response
            },
            Err(e) => {
                self.absorb(e)?;
                None
            },
        };

        if let Some(response) = &response {
            tracing::trace!(%response, "<- modem");

            if reply::is_ok(response) {
                self.health.record_success(Operation::Command);
            }
        }

        Ok(response)
    }

    async fn poll(&mut self, wait: Duration) -> Result<Option<String>, Error> {
        match self.transport.poll(wait).await {
            Ok(line) => {
                self.health.reset(Fault::Transport);
                Ok(line)
            },
            Err(e) => {
                self.absorb(e)?;
                Ok(None)
            },
        }
    }

    fn absorb(&mut self, e: transport::Error) -> Result<(), Error> {
        if e.is_fatal() {
            tracing::error!(error = %e, "modem link lost");
            return Err(e.into());
        }

        tracing::debug!(error = %e, "transient transport error");
        self.health.record_fault(Fault::Transport);

        Ok(())
    }

    /// Bring the modem to a known configuration.
    ///
    /// Returns `false` if the modem does not answer `AT` or refuses any
    /// configuration command.
    #[tracing::instrument(skip(self), fields(address = self.config.address, network_id = self.config.network_id))]
    pub async fn initialize(&mut self) -> Result<bool, Error> {
        let timeout = self.config.retry.command_timeout();
        let delay = self.config.retry.command_delay();

        if self.config.factory_reset {
            self.command(&Command::Factory, timeout).await?;
            tokio::time::sleep(RESET_SETTLE).await;
        }

        if !self.ping().await? {
            self.health.record_fault(Fault::Init);
            return Ok(false);
        }

        let steps = [
            Command::Address(self.config.address),
            Command::NetworkId(self.config.network_id),
            Command::Band(self.config.band),
            Command::Parameter(self.config.parameters),
        ];

        for step in steps {
            tokio::time::sleep(delay).await;

            let response = self.command(&step, timeout).await?;

            if response.as_deref().map_or(false, reply::is_ok) {
                continue;
            }

            match response.as_deref().and_then(reply::error_code) {
                Some(code) => tracing::warn!(command = %step, code, reason = reply::describe_error(code), "modem rejected configuration"),
                None => tracing::warn!(command = %step, ?response, "no confirmation for configuration"),
            }

            self.health.record_fault(Fault::Init);
            return Ok(false);
        }

        self.health.reset(Fault::Init);
        tracing::info!(band = self.config.band, parameters = %self.config.parameters, "modem configured");

        Ok(true)
    }

    /// Liveness check with a bare `AT`.
    pub async fn ping(&mut self) -> Result<bool, Error> {
        let timeout = self.config.retry.command_timeout();
        let response = self.command(&Command::Attention, timeout).await?;

        if response.as_deref().map_or(false, reply::is_ok) {
            return Ok(true);
        }

        tracing::warn!(?response, "modem not responding");
        Ok(false)
    }

    /// Factory-reset and restart the modem, forget sequence state and configure again.
    #[tracing::instrument(skip(self))]
    pub async fn recover(&mut self) -> Result<bool, Error> {
        let timeout = self.config.retry.command_timeout();

        tracing::warn!("recovering modem");

        self.command(&Command::Factory, timeout).await?;
        tokio::time::sleep(RESET_SETTLE).await;

        self.command(&Command::Reset, timeout).await?;
        tokio::time::sleep(RESET_SETTLE).await;

        self.health.reset_all();
        self.send_seq = 0;
        self.last_received = None;

        self.initialize().await
    }

    /// Firmware version string reported by `AT+VER?`.
    pub async fn firmware_version(&mut self) -> Result<Option<String>, Error> {
        let timeout = self.config.retry.command_timeout();
        let response = self.command(&Command::Version, timeout).await?;

        Ok(response.and_then(|response| {
            response.lines().find_map(|line| match Reply::classify(line) {
                Reply::Value {
                    name: "VER",
                    value,
                } => Some(value.trim().to_owned()),
                _ => None,
            })
        }))
    }

    #[inline]
    fn next_seq(&mut self) -> Seq {
        self.send_seq = self.send_seq.wrapping_add(1);
        self.send_seq
    }

    /// Send `payload` to the configured peer.
    ///
    /// With `require_ack`, each transmission waits for `ACK|<seq>`; a timeout
    /// retransmits under a fresh sequence number, so the receiver may deliver
    /// the payload more than once. A transmission the modem refuses is retried
    /// with the same number. Returns `false` once attempts run out.
    #[tracing::instrument(skip(self, payload), fields(len = payload.len()))]
    pub async fn send_packet(&mut self, payload: &str, require_ack: bool) -> Result<bool, Error> {
        if payload.contains(['\r', '\n']) {
            return Err(Error::InvalidPayload {
                reason: "line break in payload".to_owned(),
            });
        }

        // widest sequence field; the checksum does not change between attempts
        let worst = Packet::new(Seq::MAX, payload).encode().len();
        if worst > MAX_PAYLOAD_LEN {
            return Err(Error::InvalidPayload {
                reason: format!("packet would be {} bytes, modem limit is {}", worst, MAX_PAYLOAD_LEN),
            });
        }

        transition(SendState::Idle);

        let policy = self.config.retry;
        let mut delays = FixedInterval::new(policy.retry_delay()).take(policy.attempts() as usize - 1);

        let mut packet = Packet::new(self.next_seq(), payload);
        let mut attempt = 1u32;

        loop {
            transition(SendState::Sending);

            if self.transmit(&packet).await? {
                self.stats.sent += 1;
                self.health.reset(Fault::SendFailure);
                self.health.record_success(Operation::Send);

                if !require_ack {
                    transition(SendState::Sent);
                    return Ok(true);
                }

                transition(SendState::AwaitingAck);

                if self.await_ack(packet.seq, policy.ack_timeout()).await? {
                    self.stats.acked += 1;
                    self.health.reset(Fault::NoAck);
                    self.health.record_success(Operation::AckReceived);

                    tracing::debug!(seq = packet.seq, "acknowledged");
                    transition(SendState::Acked);
                    return Ok(true);
                }

                tracing::warn!(seq = packet.seq, "no acknowledgment");
                self.health.record_fault(Fault::NoAck);

                let delay = match delays.next() {
                    Some(delay) => delay,
                    None => break,
                };

                transition(SendState::RetryWait);
                tokio::time::sleep(delay).await;

                packet = Packet::new(self.next_seq(), payload);
            } else {
                self.health.record_fault(Fault::SendFailure);

                let delay = match delays.next() {
                    Some(delay) => delay,
                    None => break,
                };

                transition(SendState::RetryWait);
                tokio::time::sleep(delay).await;
            }

            attempt += 1;
            self.stats.retransmissions += 1;
            tracing::info!(seq = packet.seq, attempt, "retransmitting");
        }

        self.stats.exhausted += 1;
        tracing::warn!(attempts = policy.attempts(), "delivery failed");
        transition(SendState::Exhausted);

        Ok(false)
    }

    /// Hand one packet to the modem. `true` when it answered `+OK`.
    async fn transmit(&mut self, packet: &Packet) -> Result<bool, Error> {
        let command = Command::send(self.config.peer, packet.encode());
        let timeout = self.config.retry.command_timeout();

        match self.command(&command, timeout).await? {
            Some(response) if reply::is_ok(&response) => Ok(true),
            Some(response) => {
                match reply::error_code(&response) {
                    Some(code) => tracing::warn!(seq = packet.seq, code, reason = reply::describe_error(code), "transmit refused"),
                    None => tracing::warn!(seq = packet.seq, %response, "transmit not confirmed"),
                }

                Ok(false)
            },
            None => {
                tracing::warn!(seq = packet.seq, "no response to transmit");
                Ok(false)
            },
        }
    }

    /// Poll until an acknowledgment for `seq` arrives or `timeout` elapses.
    /// Everything else that arrives meanwhile is dropped.
    async fn await_ack(&mut self, seq: Seq, timeout: Duration) -> Result<bool, Error> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }

            let text = match self.poll(remaining).await? {
                Some(text) => text,
                None => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    tokio::time::sleep(IDLE_POLL.min(left)).await;
                    continue;
                },
            };

            match ack::parse_ack(&text) {
                Some((source, _)) if self.config.filter_foreign && source != self.config.peer => {
                    tracing::debug!(source, "ignoring acknowledgment from foreign node");
                    self.stats.foreign += 1;
                },
                Some((_, ack)) if ack.seq == seq => return Ok(true),
                Some((_, ack)) => tracing::debug!(got = ack.seq, want = seq, "stale acknowledgment"),
                None => tracing::trace!(%text, "ignoring while awaiting acknowledgment"),
            }
        }
    }

    /// Wait up to `timeout` for the next new packet from the peer.
    ///
    /// Every valid packet is acknowledged, repeats of the last delivered
    /// sequence number included, but a repeat is not delivered twice.
    #[tracing::instrument(skip(self))]
    pub async fn receive_packet(&mut self, timeout: Duration) -> Result<Option<String>, Error> {
        let deadline = Instant::now() + timeout;
        transition(ReceiveState::Idle);

        loop {
            transition(ReceiveState::Listening);

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let text = match self.poll(remaining).await? {
                Some(text) => text,
                None => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    tokio::time::sleep(IDLE_POLL.min(left)).await;
                    continue;
                },
            };

            transition(ReceiveState::Validating);

            match self.classify(&text) {
                Inbound::Discard => {
                    transition(ReceiveState::Discarding);
                },
                Inbound::Duplicate {
                    source,
                    seq,
                } => {
                    tracing::debug!(seq, "duplicate packet, acknowledging again");
                    self.stats.duplicates += 1;

                    transition(ReceiveState::Acking);
                    self.send_ack(seq, source).await?;
                    transition(ReceiveState::Discarding);
                },
                Inbound::Fresh {
                    source,
                    packet,
                } => {
                    self.last_received = Some(packet.seq);

                    transition(ReceiveState::Acking);
                    self.send_ack(packet.seq, source).await?;

                    self.stats.delivered += 1;
                    tracing::debug!(seq = packet.seq, len = packet.payload.len(), "delivered");
                    transition(ReceiveState::Delivering);

                    return Ok(Some(packet.payload));
                },
            }
        }
    }

    fn classify(&mut self, text: &str) -> Inbound {
        let notification = match Notification::find(text) {
            Some(notification) => notification,
            None => {
                tracing::trace!(%text, "not a receive report");
                return Inbound::Discard;
            },
        };

        tracing::trace!(source = notification.source, rssi = notification.rssi, snr = notification.snr, "receive report");

        if self.config.filter_foreign && notification.source != self.config.peer {
            tracing::debug!(source = notification.source, "ignoring packet from foreign node");
            self.stats.foreign += 1;
            return Inbound::Discard;
        }

        let packet = match Packet::decode(&notification.payload) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!(error = %e, payload = %notification.payload, "malformed packet");

                match e {
                    DecodeError::Checksum => self.stats.checksum_failures += 1,
                    DecodeError::Malformed | DecodeError::Sequence => self.stats.malformed += 1,
                }

                return Inbound::Discard;
            },
        };

        if !packet.verify() {
            tracing::warn!(seq = packet.seq, crc = packet.crc, "checksum mismatch");
            self.stats.checksum_failures += 1;
            return Inbound::Discard;
        }

        if self.last_received == Some(packet.seq) {
            return Inbound::Duplicate {
                source: notification.source,
                seq:    packet.seq,
            };
        }

        Inbound::Fresh {
            source: notification.source,
            packet,
        }
    }
}

use message::{
    reply,
    Ack,
    Address,
    Command,
    Notification,
    Seq,
};

use crate::{
    endpoint::Endpoint,
    transport::Transport,
    Error,
};

/// Whether `text` carries a receive report whose payload acknowledges `expected`.
pub fn try_parse_ack(text: &str, expected: Seq) -> bool {
    parse_ack(text).map_or(false, |(_, ack)| ack.seq == expected)
}

/// Source address and acknowledgment carried by a receive report, if any.
pub fn parse_ack(text: &str) -> Option<(Address, Ack)> {
    let notification = Notification::find(text)?;
    let ack = Ack::parse(&notification.payload)?;

    Some((notification.source, ack))
}

impl<T> Endpoint<T>
where
    T: Transport,
{
    /// Acknowledge `seq` to `destination`. Sent once: acknowledgments are not
    /// themselves acknowledged, and a lost one is covered by the sender's retry.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn send_ack(&mut self, seq: Seq, destination: Address) -> Result<bool, Error> {
        let command = Command::send(destination, Ack::new(seq).to_string());
        let timeout = self.config().retry.command_timeout();

        let accepted = match self.command(&command, timeout).await? {
            Some(response) if reply::is_ok(&response) => true,
            Some(response) => {
                tracing::warn!(%response, "modem refused acknowledgment");
                false
            },
            None => {
                tracing::warn!("no response sending acknowledgment");
                false
            },
        };

        if accepted {
            self.stats.acks_sent += 1;
        }

        Ok(accepted)
    }
}

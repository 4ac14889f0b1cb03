#![allow(dead_code)]

use std::{
    collections::VecDeque,
    time::Duration,
};

use loralink_runtime::{
    transport::{
        Error,
        Transport,
    },
    Endpoint,
    LinkConfig,
};

type Responder = Box<dyn FnMut(&str, &mut VecDeque<String>) -> Option<String> + Send>;

/// Scripted modem. Every command is recorded; the responder decides the reply
/// and may queue receive reports for later polls.
pub struct MockModem {
    pub commands: Vec<String>,
    inbound:      VecDeque<String>,
    errors:       VecDeque<Error>,
    responder:    Responder,
}

impl MockModem {
    /// Answers `+OK` to everything.
    pub fn new() -> Self {
        Self::with_responder(|_, _| Some("+OK".to_owned()))
    }

    pub fn with_responder(responder: impl FnMut(&str, &mut VecDeque<String>) -> Option<String> + Send + 'static) -> Self {
        Self {
            commands:  vec![],
            inbound:   VecDeque::new(),
            errors:    VecDeque::new(),
            responder: Box::new(responder),
        }
    }

    pub fn push_inbound(&mut self, line: impl Into<String>) {
        self.inbound.push_back(line.into());
    }

    /// Returned by the next poll, ahead of any inbound line.
    pub fn push_error(&mut self, error: Error) {
        self.errors.push_back(error);
    }

    /// Data fields of every `AT+SEND` issued, as `(destination, data)`.
    pub fn sends(&self) -> Vec<(u16, String)> {
        self.commands
            .iter()
            .filter_map(|c| c.strip_prefix("AT+SEND="))
            .map(|rest| {
                let mut fields = rest.splitn(3, ',');
                let dest = fields.next().unwrap().parse().unwrap();
                let _len = fields.next().unwrap();

                (dest, fields.next().unwrap().to_owned())
            })
            .collect()
    }

    /// Sequence numbers of data packets sent, acknowledgments excluded.
    pub fn sent_seqs(&self) -> Vec<u8> {
        self.sends()
            .into_iter()
            .filter(|(_, data)| !data.starts_with("ACK|"))
            .map(|(_, data)| data.split('|').next().unwrap().parse().unwrap())
            .collect()
    }

    pub fn acks_sent(&self) -> Vec<(u16, String)> {
        self.sends().into_iter().filter(|(_, data)| data.starts_with("ACK|")).collect()
    }
}

#[async_trait::async_trait]
impl Transport for MockModem {
    async fn send_command(&mut self, command: &str, wait: Duration) -> Result<Option<String>, Error> {
        self.commands.push(command.to_owned());

        let reply = (self.responder)(command, &mut self.inbound);

        if wait.is_zero() {
            return Ok(None);
        }

        if reply.is_none() {
            tokio::time::sleep(wait).await;
        }

        Ok(reply)
    }

    async fn poll(&mut self, wait: Duration) -> Result<Option<String>, Error> {
        if let Some(e) = self.errors.pop_front() {
            return Err(e);
        }

        match self.inbound.pop_front() {
            Some(line) => Ok(Some(line)),
            None => {
                tokio::time::sleep(wait).await;
                Ok(None)
            },
        }
    }
}

/// Address 1 talking to peer 2.
pub fn sender(modem: MockModem) -> Endpoint<MockModem> {
    Endpoint::new(modem, LinkConfig::default())
}

/// Address 2 talking to peer 1.
pub fn receiver(modem: MockModem) -> Endpoint<MockModem> {
    let config = LinkConfig {
        address: 2,
        peer: 1,
        ..Default::default()
    };

    Endpoint::new(modem, config)
}

/// Acknowledge every data packet sent to `peer` as if `peer` replied.
pub fn acking_peer(peer: u16) -> MockModem {
    MockModem::with_responder(move |command, inbound| {
        if let Some(rest) = command.strip_prefix(&format!("AT+SEND={},", peer)) {
            let data = rest.splitn(2, ',').nth(1).unwrap_or_default();
            let seq = data.split('|').next().unwrap_or_default();
            let ack = format!("ACK|{}", seq);

            inbound.push_back(format!("+RCV={},{},{},-40,9", peer, ack.len(), ack));
        }

        Some("+OK".to_owned())
    })
}

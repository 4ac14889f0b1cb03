use std::{
    collections::VecDeque,
    time::Duration,
};

use codec::{
    tokio_codec::{
        FramedRead,
        FramedWrite,
    },
    LineCodec,
};
use futures::{
    SinkExt,
    StreamExt,
};
use message::Reply;
use tokio::{
    io::{
        AsyncRead,
        AsyncWrite,
    },
    time::Instant,
};

use crate::transport::{
    Error,
    Transport,
};

/// Receive reports kept while a command is in flight. Oldest are dropped past this.
pub const MAX_PENDING: usize = 32;

/// [`Transport`] over a byte stream carrying the modem's line protocol.
///
/// Receive reports that show up while a command response is being collected
/// are queued and handed out by the next [`Transport::poll`].
pub struct SerialModem<R, W> {
    read:    FramedRead<R, LineCodec>,
    write:   FramedWrite<W, LineCodec>,
    pending: VecDeque<String>,
}

impl<R, W> SerialModem<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(read: R, write: W) -> Self {
        Self {
            read:    FramedRead::new(read, LineCodec::new()),
            write:   FramedWrite::new(write, LineCodec::new()),
            pending: VecDeque::new(),
        }
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Next non-empty line before `deadline`, trimmed.
    async fn next_line(&mut self, deadline: Instant) -> Result<Option<String>, Error> {
        loop {
            let line = match tokio::time::timeout_at(deadline, self.read.next()).await {
                Err(_elapsed) => return Ok(None),
                Ok(None) => return Err(Error::Disconnected),
                Ok(Some(result)) => result?,
            };

            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            return Ok(Some(line.to_owned()));
        }
    }

    fn defer(&mut self, line: String) {
        if self.pending.len() >= MAX_PENDING {
            tracing::warn!(capacity = MAX_PENDING, "pending receive queue full, dropping oldest");
            self.pending.pop_front();
        }

        self.pending.push_back(line);
    }
}

#[async_trait::async_trait]
impl<R, W> Transport for SerialModem<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    #[tracing::instrument(skip(self), err(Display), level = "trace")]
    async fn send_command(&mut self, command: &str, wait: Duration) -> Result<Option<String>, Error> {
        self.write.send(command).await?;

        if wait.is_zero() {
            return Ok(None);
        }

        let deadline = Instant::now() + wait;
        let mut lines = vec![];

        while let Some(line) = self.next_line(deadline).await? {
            match Reply::classify(&line) {
                Reply::Notification => {
                    tracing::trace!(%line, "deferring receive report seen during command");
                    self.defer(line);
                },
                reply => {
                    let done = reply.is_final();
                    lines.push(line);

                    if done {
                        break;
                    }
                },
            }
        }

        if lines.is_empty() {
            tracing::debug!(?wait, "no response to command");
            return Ok(None);
        }

        Ok(Some(lines.join("\n")))
    }

    async fn poll(&mut self, wait: Duration) -> Result<Option<String>, Error> {
        if let Some(line) = self.pending.pop_front() {
            return Ok(Some(line));
        }

        self.next_line(Instant::now() + wait).await
    }
}

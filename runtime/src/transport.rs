use std::{
    io,
    time::Duration,
};

/// Command/response access to the radio module.
///
/// Implementations never retry; that policy belongs to the caller.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Write `command` and its line terminator, then collect the modem's answer
    /// for up to `wait`. A zero `wait` returns `Ok(None)` without reading.
    async fn send_command(&mut self, command: &str, wait: Duration) -> Result<Option<String>, Error>;

    /// Next unsolicited line, waiting up to `wait`.
    async fn poll(&mut self, wait: Duration) -> Result<Option<String>, Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("modem stream closed")]
    Disconnected,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the link is gone, as opposed to a hiccup worth polling through.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Disconnected => true,
            Error::Io(e) => !matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ),
        }
    }
}

#[async_trait::async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    #[inline]
    async fn send_command(&mut self, command: &str, wait: Duration) -> Result<Option<String>, Error> {
        (**self).send_command(command, wait).await
    }

    #[inline]
    async fn poll(&mut self, wait: Duration) -> Result<Option<String>, Error> {
        (**self).poll(wait).await
    }
}

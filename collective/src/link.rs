//! Point-to-point frame transports between the coordinator and one peer.

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::Error;
use crate::frame::{self, Frame};

/// A bidirectional, ordered frame transport.
#[async_trait]
pub trait Link: Send {
    async fn send(&mut self, frame: Frame) -> Result<(), Error>;

    async fn recv(&mut self) -> Result<Frame, Error>;
}

/// A link over a TCP connection.
pub struct TcpLink {
    stream: TcpStream,
}

impl TcpLink {
    pub fn new(stream: TcpStream) -> Result<Self, Error> {
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

#[async_trait]
impl Link for TcpLink {
    async fn send(&mut self, frame: Frame) -> Result<(), Error> {
        frame::write_frame(&mut self.stream, &frame).await
    }

    async fn recv(&mut self) -> Result<Frame, Error> {
        frame::read_frame(&mut self.stream).await
    }
}

/// An in-process link backed by a pair of unbounded channels.
pub struct ChannelLink {
    tx: mpsc::UnboundedSender<Frame>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl ChannelLink {
    /// Creates both ends of a connected link.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self { tx: a_tx, rx: b_rx }, Self { tx: b_tx, rx: a_rx })
    }
}

#[async_trait]
impl Link for ChannelLink {
    async fn send(&mut self, frame: Frame) -> Result<(), Error> {
        self.tx.send(frame).map_err(|_| Error::ConnectionClosed)
    }

    async fn recv(&mut self) -> Result<Frame, Error> {
        self.rx.recv().await.ok_or(Error::ConnectionClosed)
    }
}

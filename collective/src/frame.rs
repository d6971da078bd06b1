//! Wire messages exchanged between ranks.
//!
//! On a byte stream every frame is a big-endian `u32` length followed by the
//! protobuf encoding of [`Frame`].

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::Error;

/// Largest encoded frame accepted from a stream (1 GiB).
pub const MAX_FRAME_LEN: usize = 1 << 30;

/// A single message between the coordinator and one peer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Frame {
    /// Rank of the sender.
    #[prost(uint32, tag = "1")]
    pub rank: u32,
    #[prost(enumeration = "Kind", tag = "2")]
    pub kind: i32,
    #[prost(double, repeated, tag = "3")]
    pub payload: Vec<f64>,
    /// Element count of the whole message this frame carries a piece of.
    #[prost(uint64, tag = "4")]
    pub total: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Kind {
    Hello = 0,
    Broadcast = 1,
    Ack = 2,
    Scatter = 3,
    Gather = 4,
}

impl Frame {
    /// A frame carrying the whole of `payload`.
    pub fn new(rank: usize, kind: Kind, payload: Vec<f64>) -> Result<Self, Error> {
        let total = payload.len() as u64;
        Self::piece(rank, kind, total, payload)
    }

    /// A frame carrying one piece of a message of `total` elements.
    pub fn piece(rank: usize, kind: Kind, total: u64, payload: Vec<f64>) -> Result<Self, Error> {
        Ok(Self {
            rank: u32::try_from(rank).map_err(|_| Error::RankTooLarge(rank))?,
            kind: kind as i32,
            payload,
            total,
        })
    }

    /// Returns the frame kind, rejecting values this build does not know.
    pub fn frame_kind(&self) -> Result<Kind, Error> {
        Kind::try_from(self.kind).map_err(|_| Error::UnknownKind(self.kind))
    }

    /// Checks that this frame is of `expected` kind and came from rank `from`.
    pub(crate) fn expect(self, expected: Kind, from: usize) -> Result<Self, Error> {
        let got = self.frame_kind()?;
        if got != expected {
            return Err(Error::UnexpectedFrame { expected, got });
        }
        if self.rank as usize != from {
            return Err(Error::RankMismatch {
                expected: from,
                got: self.rank as usize,
            });
        }
        Ok(self)
    }
}

pub(crate) async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let body = frame.encode_to_vec();
    if body.len() > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge(body.len()));
    }
    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Frame, Error>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(Error::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Frame::decode(body.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_over_stream() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let frame = Frame::new(3, Kind::Gather, vec![1.5, -2.0, 0.25]).unwrap();

        let writer = tokio::spawn(async move { write_frame(&mut client, &frame).await });
        let received = read_frame(&mut server).await.unwrap();
        writer.await.unwrap().unwrap();

        assert_eq!(received.rank, 3);
        assert_eq!(received.frame_kind().unwrap(), Kind::Gather);
        assert_eq!(received.payload, vec![1.5, -2.0, 0.25]);
        assert_eq!(received.total, 3);
    }

    #[tokio::test]
    async fn test_closed_stream() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);

        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_oversized_length_prefix() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32(u32::MAX).await.unwrap();

        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge(_)));
    }

    #[test]
    fn test_expect_checks_kind_and_rank() {
        let frame = Frame::new(2, Kind::Ack, Vec::new()).unwrap();
        assert!(frame.clone().expect(Kind::Ack, 2).is_ok());
        assert!(matches!(
            frame.clone().expect(Kind::Gather, 2),
            Err(Error::UnexpectedFrame { .. })
        ));
        assert!(matches!(
            frame.expect(Kind::Ack, 1),
            Err(Error::RankMismatch { expected: 1, got: 2 })
        ));

        let mut bogus = Frame::new(0, Kind::Hello, Vec::new()).unwrap();
        bogus.kind = 42;
        assert!(matches!(bogus.frame_kind(), Err(Error::UnknownKind(42))));
    }

    #[test]
    fn test_rank_must_fit_header() {
        let max = u32::MAX as usize;
        assert_eq!(Frame::new(max, Kind::Ack, Vec::new()).unwrap().rank, u32::MAX);
        assert!(matches!(
            Frame::new(max + 1, Kind::Ack, Vec::new()),
            Err(Error::RankTooLarge(r)) if r == max + 1
        ));
    }
}

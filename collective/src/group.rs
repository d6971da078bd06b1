//! A fixed set of ranks with blocking collective operations.

use futures_util::future::try_join_all;
use tracing::debug;

use crate::Error;
use crate::frame::{Frame, Kind};
use crate::link::{ChannelLink, Link};

/// Largest number of elements a collective puts in one frame (64 MiB of
/// payload). Longer buffers travel as a sequence of frames.
pub const MAX_CHUNK_LEN: usize = 8 << 20;

/// A fixed group of ranks connected in a star around rank 0.
///
/// Every rank calls the same collectives in the same order. Rank 0, the
/// coordinator, holds one link per peer and owns the rendezvous: it is the
/// root of [`broadcast`](Group::broadcast) and [`scatter`](Group::scatter)
/// and the destination of [`gather`](Group::gather). Each collective blocks
/// until the rank's part of the exchange is complete; a rank that never
/// reaches the call stalls the others.
pub struct Group<L> {
    rank: usize,
    size: usize,
    chunk_len: usize,
    role: Role<L>,
}

enum Role<L> {
    /// Links to ranks `1..size`, in rank order.
    Coordinator { peers: Vec<L> },
    Peer { root: L },
}

impl<L: Link> Group<L> {
    /// Creates rank 0 of a group, given links to ranks `1..=peers.len()`.
    pub fn coordinator(peers: Vec<L>) -> Self {
        Self {
            rank: 0,
            size: peers.len() + 1,
            chunk_len: MAX_CHUNK_LEN,
            role: Role::Coordinator { peers },
        }
    }

    /// Creates a non-coordinating rank connected to rank 0 by `root`.
    pub fn peer(rank: usize, size: usize, root: L) -> Result<Self, Error> {
        if rank == 0 || rank >= size {
            return Err(Error::UnknownRank { rank, size });
        }
        Ok(Self {
            rank,
            size,
            chunk_len: MAX_CHUNK_LEN,
            role: Role::Peer { root },
        })
    }

    /// Limits the elements this rank puts in one frame, clamped to
    /// `1..=MAX_CHUNK_LEN`. Receivers reassemble any split.
    pub fn with_chunk_len(mut self, chunk_len: usize) -> Self {
        self.chunk_len = chunk_len.clamp(1, MAX_CHUNK_LEN);
        self
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    pub fn is_coordinator(&self) -> bool {
        matches!(self.role, Role::Coordinator { .. })
    }

    /// Replicates the coordinator's `buf` into `buf` on every rank.
    ///
    /// The coordinator returns once every peer acknowledged its copy. Peers
    /// must pass a buffer of the same length as the coordinator's.
    pub async fn broadcast(&mut self, buf: &mut [f64]) -> Result<(), Error> {
        let rank = self.rank;
        let chunk_len = self.chunk_len;
        match &mut self.role {
            Role::Coordinator { peers } => {
                let data: &[f64] = buf;
                try_join_all(
                    peers
                        .iter_mut()
                        .map(|peer| send_pieces(peer, rank, Kind::Broadcast, data, chunk_len)),
                )
                .await?;

                let acks = try_join_all(peers.iter_mut().map(|peer| peer.recv())).await?;
                for (i, ack) in acks.into_iter().enumerate() {
                    ack.expect(Kind::Ack, i + 1)?;
                }
                debug!(len = data.len(), peers = peers.len(), "broadcast complete");
            }
            Role::Peer { root } => {
                let len = buf.len();
                recv_pieces(root, Kind::Broadcast, 0, len, |offset, piece| {
                    buf[offset..offset + piece.len()].copy_from_slice(piece);
                })
                .await?;
                root.send(Frame::new(rank, Kind::Ack, Vec::new())?).await?;
            }
        }
        Ok(())
    }

    /// Splits the coordinator's `data` into consecutive pieces of
    /// `counts[r]` elements and hands piece `r` to rank `r`.
    ///
    /// Peers pass `None` for `data`. Every rank passes the same `counts`.
    pub async fn scatter(&mut self, data: Option<&[f64]>, counts: &[usize]) -> Result<Vec<f64>, Error> {
        self.check_counts(counts)?;

        let rank = self.rank;
        let chunk_len = self.chunk_len;
        match &mut self.role {
            Role::Coordinator { peers } => {
                let data = data.ok_or(Error::MissingScatterData)?;
                check_len(counts.iter().sum(), data.len())?;

                let mut pieces = Vec::with_capacity(counts.len());
                let mut offset = 0;
                for &count in counts {
                    pieces.push(&data[offset..offset + count]);
                    offset += count;
                }

                try_join_all(
                    peers
                        .iter_mut()
                        .zip(&pieces[1..])
                        .map(|(peer, piece)| send_pieces(peer, rank, Kind::Scatter, piece, chunk_len)),
                )
                .await?;
                Ok(pieces[0].to_vec())
            }
            Role::Peer { root } => {
                let count = counts[rank];
                let mut out = alloc(count)?;
                recv_pieces(root, Kind::Scatter, 0, count, |_, piece| out.extend_from_slice(piece)).await?;
                Ok(out)
            }
        }
    }

    /// Concatenates every rank's `local` buffer in increasing rank order.
    ///
    /// Rank `r` contributes exactly `counts[r]` elements; every rank passes
    /// the same `counts`. Returns the assembled buffer on the coordinator
    /// and `None` elsewhere.
    pub async fn gather(&mut self, local: &[f64], counts: &[usize]) -> Result<Option<Vec<f64>>, Error> {
        self.check_counts(counts)?;
        check_len(counts[self.rank], local.len())?;

        let rank = self.rank;
        let chunk_len = self.chunk_len;
        match &mut self.role {
            Role::Coordinator { peers } => {
                let mut out = alloc(counts.iter().sum())?;
                out.extend_from_slice(local);
                for (i, (peer, &count)) in peers.iter_mut().zip(&counts[1..]).enumerate() {
                    recv_pieces(peer, Kind::Gather, i + 1, count, |_, piece| out.extend_from_slice(piece)).await?;
                }
                debug!(len = out.len(), "gather complete");
                Ok(Some(out))
            }
            Role::Peer { root } => {
                send_pieces(root, rank, Kind::Gather, local, chunk_len).await?;
                Ok(None)
            }
        }
    }

    fn check_counts(&self, counts: &[usize]) -> Result<(), Error> {
        if counts.len() != self.size {
            return Err(Error::CountMismatch {
                counts: counts.len(),
                size: self.size,
            });
        }
        Ok(())
    }
}

impl Group<ChannelLink> {
    /// Builds an in-process group of `size` ranks; element `r` is rank `r`.
    pub fn local(size: usize) -> Result<Vec<Self>, Error> {
        if size == 0 {
            return Err(Error::EmptyGroup);
        }

        let mut peers = Vec::with_capacity(size - 1);
        let mut others = Vec::with_capacity(size - 1);
        for rank in 1..size {
            let (root_end, peer_end) = ChannelLink::pair();
            peers.push(root_end);
            others.push(Group::peer(rank, size, peer_end)?);
        }

        let mut group = Vec::with_capacity(size);
        group.push(Group::coordinator(peers));
        group.extend(others);
        Ok(group)
    }
}

/// Sends `data` as frames of at most `chunk_len` elements. An empty buffer
/// still sends one frame.
async fn send_pieces<L: Link>(
    link: &mut L,
    rank: usize,
    kind: Kind,
    data: &[f64],
    chunk_len: usize,
) -> Result<(), Error> {
    let total = data.len() as u64;
    if data.is_empty() {
        return link.send(Frame::piece(rank, kind, total, Vec::new())?).await;
    }
    for piece in data.chunks(chunk_len) {
        link.send(Frame::piece(rank, kind, total, piece.to_vec())?).await?;
    }
    Ok(())
}

/// Receives a message of exactly `expected` elements from rank `from`,
/// handing each piece to `sink` along with its offset.
async fn recv_pieces<L: Link>(
    link: &mut L,
    kind: Kind,
    from: usize,
    expected: usize,
    mut sink: impl FnMut(usize, &[f64]),
) -> Result<(), Error> {
    let mut received = 0;
    loop {
        let frame = link.recv().await?.expect(kind, from)?;
        check_len(expected, usize::try_from(frame.total).unwrap_or(usize::MAX))?;

        let end = received + frame.payload.len();
        if end > expected || (frame.payload.is_empty() && received < expected) {
            return Err(Error::LengthMismatch { expected, got: end });
        }
        sink(received, &frame.payload);
        received = end;
        if received == expected {
            return Ok(());
        }
    }
}

fn alloc(len: usize) -> Result<Vec<f64>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::AllocationFailure(len))?;
    Ok(buf)
}

fn check_len(expected: usize, got: usize) -> Result<(), Error> {
    if expected != got {
        return Err(Error::LengthMismatch { expected, got });
    }
    Ok(())
}

//! Forming a [`Group`] of processes over TCP.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;
use tracing::{debug, warn};

use crate::Error;
use crate::frame::{Frame, Kind};
use crate::group::Group;
use crate::link::{Link, TcpLink};

const CONNECT_ATTEMPTS: usize = 8;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// Joins the group as `rank` of `size`.
///
/// Rank 0 listens on `addr` and waits for every other rank to connect; the
/// others connect to `addr`. A group of one does no networking.
pub async fn join(addr: impl Into<CoordinatorAddr>, rank: usize, size: usize) -> Result<Group<TcpLink>, Error> {
    if size == 0 {
        return Err(Error::EmptyGroup);
    }
    if rank >= size {
        return Err(Error::UnknownRank { rank, size });
    }
    if size == 1 {
        return Ok(Group::coordinator(Vec::new()));
    }

    let addr = addr.into();
    if rank == 0 {
        let listener = TcpListener::bind(addr.0.as_str()).await?;
        accept(listener, size).await
    } else {
        connect(addr, rank, size).await
    }
}

/// Accepts `size - 1` peers on `listener` and returns the coordinator.
///
/// Peers may connect in any order; each announces its rank with a hello
/// frame and is slotted by that rank.
pub async fn accept(listener: TcpListener, size: usize) -> Result<Group<TcpLink>, Error> {
    debug!(addr = ?listener.local_addr().ok(), size, "waiting for peers");

    let mut slots: Vec<Option<TcpLink>> = (1..size).map(|_| None).collect();
    let mut pending = size - 1;
    let mut incoming = TcpListenerStream::new(listener);

    while pending > 0 {
        let stream = incoming.next().await.ok_or(Error::ConnectionClosed)??;
        let mut link = TcpLink::new(stream)?;

        let hello = link.recv().await?;
        if hello.frame_kind()? != Kind::Hello {
            return Err(Error::UnexpectedFrame {
                expected: Kind::Hello,
                got: hello.frame_kind()?,
            });
        }

        let rank = hello.rank as usize;
        if rank == 0 || rank >= size {
            return Err(Error::UnknownRank { rank, size });
        }
        let slot = &mut slots[rank - 1];
        if slot.is_some() {
            return Err(Error::DuplicateRank(rank));
        }
        *slot = Some(link);
        pending -= 1;
        debug!(rank, pending, "peer joined");
    }

    Ok(Group::coordinator(slots.into_iter().flatten().collect()))
}

/// Connects to the coordinator as `rank`, retrying with exponential backoff
/// while the coordinator is not yet listening.
pub async fn connect(addr: impl Into<CoordinatorAddr>, rank: usize, size: usize) -> Result<Group<TcpLink>, Error> {
    let addr = addr.into();
    let mut delay = INITIAL_BACKOFF;
    let mut attempts = 0;

    let stream = loop {
        attempts += 1;
        match TcpStream::connect(addr.0.as_str()).await {
            Ok(stream) => break stream,
            Err(e) if attempts < CONNECT_ATTEMPTS => {
                debug!(rank, attempts, error = %e, "coordinator not reachable yet");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                warn!(rank, attempts, error = %e, "giving up on coordinator");
                return Err(Error::Unreachable {
                    addr: addr.0,
                    attempts,
                });
            }
        }
    };

    let mut link = TcpLink::new(stream)?;
    link.send(Frame::new(rank, Kind::Hello, Vec::new())?).await?;
    debug!(rank, addr = %addr.0, "joined coordinator");
    Group::peer(rank, size, link)
}

/// Address the coordinator listens on, e.g. `"127.0.0.1:50051"`.
#[derive(Clone, Debug)]
pub struct CoordinatorAddr(pub String);

impl From<String> for CoordinatorAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CoordinatorAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<std::net::SocketAddr> for CoordinatorAddr {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

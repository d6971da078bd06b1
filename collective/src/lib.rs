//! Collective operations between benchmark worker processes.
//!
//! `collective` connects a fixed number of ranks in a star around rank 0
//! and offers the three blocking collectives a row-block decomposition
//! needs: [`Group::broadcast`], [`Group::scatter`] and [`Group::gather`].
//!
//! Ranks exchange [`Frame`]s over a [`Link`]. Two links are provided:
//! [`TcpLink`] for separate processes (see [`tcp::join`]) and
//! [`ChannelLink`] for ranks living in one process (see [`Group::local`]).
//! Buffers longer than [`MAX_CHUNK_LEN`] elements are split across frames
//! and reassembled by the receiver.
//!
//! # Example
//!
//! ```no_run
//! use collective::tcp;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rank = 1;
//!     let mut group = tcp::join("127.0.0.1:50051", rank, 2).await?;
//!
//!     let mut b = vec![0.0; 4];
//!     group.broadcast(&mut b).await?;
//!     let mine = group.scatter(None, &[2, 2]).await?;
//!     assert!(group.gather(&mine, &[2, 2]).await?.is_none());
//!
//!     Ok(())
//! }
//! ```

mod error;
mod frame;
mod group;
mod link;
pub mod tcp;

pub use error::Error;
pub use frame::{Frame, Kind, MAX_FRAME_LEN};
pub use group::{Group, MAX_CHUNK_LEN};
pub use link::{ChannelLink, Link, TcpLink};
pub use tcp::CoordinatorAddr;

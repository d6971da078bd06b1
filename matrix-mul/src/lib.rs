//! Dense square matrix multiplication benchmarks.
//!
//! `matrix-mul` times the textbook triple-loop product `C = A × B` of two
//! all-ones `N`×`N` matrices under three strategies:
//!
//! - **Sequential**: one thread, see [`sequential`].
//! - **Shared memory**: a [`WorkerPool`] of threads sharing the rows of `C`
//!   by a static, dynamic or guided [`Schedule`], see [`shared`].
//! - **Hybrid**: ranks of a [`collective::Group`] each own a [`RowBlock`] of
//!   rows and multiply it on a worker pool; the blocks are gathered on rank 0,
//!   see [`hybrid`].
//!
//! All strategies accumulate each dot product in the same order, so their
//! results are bit-identical for any input.
//!
//! # Example
//!
//! ```
//! use matrix_mul::{Matrix, Schedule, SchedulePolicy, WorkerPool, sequential, shared};
//!
//! let a = Matrix::workload(64).unwrap();
//! let b = Matrix::workload(64).unwrap();
//!
//! let pool = WorkerPool::new(4, Schedule::new(SchedulePolicy::Guided, 2).unwrap()).unwrap();
//! let parallel = shared::multiply(&pool, &a, &b).unwrap();
//!
//! assert_eq!(parallel, sequential::multiply(&a, &b).unwrap());
//! assert_eq!(parallel.get(0, 0), 64.0);
//! ```

pub mod cli;
mod error;
pub mod hybrid;
pub mod kernel;
pub mod launch;
pub mod matrix;
pub mod pool;
pub mod record;
pub mod row_block;
pub mod schedule;
pub mod sequential;
pub mod shared;
pub mod telemetry;
pub mod timer;

pub use error::Error;
pub use hybrid::{HybridConfig, HybridReport, Operands};
pub use launch::LaunchEnv;
pub use matrix::Matrix;
pub use pool::{PoolReport, WorkerPool};
pub use row_block::RowBlock;
pub use schedule::{Schedule, SchedulePolicy};

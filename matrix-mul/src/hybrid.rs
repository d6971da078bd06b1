//! The hybrid multiplier: row blocks across ranks, threads within a rank.

use collective::{Group, Link};
use tracing::{debug, info};

use crate::Error;
use crate::matrix::{self, Matrix};
use crate::pool::WorkerPool;
use crate::row_block::RowBlock;
use crate::schedule::Schedule;
use crate::timer::{self, PhaseTimings, Stopwatch};

/// Settings shared by every rank of a hybrid run.
#[derive(Clone, Copy, Debug)]
pub struct HybridConfig {
    pub n: usize,
    pub schedule: Schedule,
    /// Threads per rank.
    pub threads: usize,
}

/// The coordinator's input matrices.
#[derive(Clone, Debug)]
pub struct Operands {
    pub a: Matrix,
    pub b: Matrix,
}

impl Operands {
    /// The benchmark workload: both operands all ones.
    pub fn workload(n: usize) -> Result<Self, Error> {
        Ok(Self {
            a: Matrix::workload(n)?,
            b: Matrix::workload(n)?,
        })
    }
}

/// What one rank observed of a hybrid run.
#[derive(Clone, Debug)]
pub struct HybridReport {
    pub rank: usize,
    pub workers: usize,
    pub block: RowBlock,
    /// The assembled product; only present on the coordinator.
    pub result: Option<Matrix>,
    pub timings: PhaseTimings,
}

impl HybridReport {
    /// The line the coordinator prints at the end of a run.
    pub fn summary_line(&self, config: &HybridConfig) -> String {
        format!(
            "Hybrid N={} P={} T={} schedule={}: total={} compute={} comm={}",
            config.n,
            self.workers,
            config.threads,
            config.schedule.policy(),
            timer::secs(self.timings.total),
            timer::secs(self.timings.compute),
            timer::secs(self.timings.comm),
        )
    }
}

/// Runs one rank of a hybrid multiply. Every rank of `group` must call this
/// with the same `config`.
///
/// The coordinator multiplies `operands`, or the all-ones workload when
/// `None`; other ranks ignore `operands`. B is broadcast and A scattered by
/// row block before timing starts. Each rank then multiplies its block on a
/// [`WorkerPool`] and the blocks are gathered, in rank order, into the
/// coordinator's result.
pub async fn run<L: Link>(
    group: &mut Group<L>,
    config: &HybridConfig,
    operands: Option<Operands>,
) -> Result<HybridReport, Error> {
    let n = config.n;
    let len = matrix::elements(n)?;
    let pool = WorkerPool::new(config.threads, config.schedule)?;

    let rank = group.rank();
    let workers = group.size();
    let blocks = RowBlock::partition(workers, n)?;
    let block = blocks[rank];
    let counts: Vec<usize> = blocks.iter().map(|block| block.len() * n).collect();

    let (a, mut b) = if group.is_coordinator() {
        let operands = match operands {
            Some(operands) => operands,
            None => Operands::workload(n)?,
        };
        for m in [&operands.a, &operands.b] {
            if m.dim() != n {
                return Err(Error::ShapeMismatch {
                    expected: len,
                    got: m.as_slice().len(),
                });
            }
        }
        (Some(operands.a), operands.b.into_vec())
    } else {
        (None, matrix::alloc_filled(len, 0.0)?)
    };

    group.broadcast(&mut b).await?;
    let a_block = group.scatter(a.as_ref().map(Matrix::as_slice), &counts).await?;
    drop(a);
    let mut c_block = matrix::alloc_filled(block.len() * n, 0.0)?;
    debug!(rank, rows = ?block.range(), "operands distributed");

    let total = Stopwatch::start();
    let compute = Stopwatch::start();
    let (c_block, pool_report) = tokio::task::spawn_blocking(move || {
        let report = pool.multiply(&a_block, &b, &mut c_block, n)?;
        Ok::<_, Error>((c_block, report))
    })
    .await??;
    let compute = compute.elapsed();

    let comm = Stopwatch::start();
    let gathered = group.gather(&c_block, &counts).await?;
    let comm = comm.elapsed();
    let total = total.elapsed();

    info!(
        rank,
        rows = block.len(),
        rows_per_thread = ?pool_report.rows_per_worker,
        compute = ?compute,
        comm = ?comm,
        "rank finished"
    );

    let result = gathered.map(|data| Matrix::from_vec(n, data)).transpose()?;
    Ok(HybridReport {
        rank,
        workers,
        block,
        result,
        timings: PhaseTimings {
            total,
            compute,
            comm,
        },
    })
}

//! The shared-memory parallel multiplier.

use tracing::info;

use crate::Error;
use crate::matrix::Matrix;
use crate::pool::{PoolReport, WorkerPool};
use crate::sequential::Product;
use crate::timer::Stopwatch;

/// Computes `c = a × b` with the rows of `c` shared among `pool`'s threads.
pub fn multiply_into(pool: &WorkerPool, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<PoolReport, Error> {
    pool.multiply(a.as_slice(), b.as_slice(), c.as_mut_slice(), a.dim())
}

pub fn multiply(pool: &WorkerPool, a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
    let mut c = Matrix::zeros(a.dim())?;
    multiply_into(pool, a, b, &mut c)?;
    Ok(c)
}

/// Runs the benchmark workload on `pool`. Only the multiply is timed.
pub fn run(n: usize, pool: &WorkerPool) -> Result<Product, Error> {
    let a = Matrix::workload(n)?;
    let b = Matrix::workload(n)?;
    let mut c = Matrix::zeros(n)?;

    let watch = Stopwatch::start();
    multiply_into(pool, &a, &b, &mut c)?;
    let elapsed = watch.elapsed();

    info!(
        n,
        threads = pool.threads(),
        schedule = %pool.schedule().policy(),
        chunk = pool.schedule().chunk(),
        elapsed = ?elapsed,
        "shared-memory multiply complete"
    );
    Ok(Product { result: c, elapsed })
}

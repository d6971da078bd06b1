//! The single-threaded multiplier.

use std::time::Duration;

use tracing::info;

use crate::Error;
use crate::kernel;
use crate::matrix::Matrix;
use crate::timer::Stopwatch;

/// A computed product and the time spent computing it.
#[derive(Clone, Debug)]
pub struct Product {
    pub result: Matrix,
    pub elapsed: Duration,
}

/// Computes `c = a × b` on the calling thread.
pub fn multiply_into(a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<(), Error> {
    let n = a.dim();
    kernel::check_block(a.as_slice(), b.as_slice(), c.as_slice(), n)?;
    kernel::multiply_rows(a.as_slice(), b.as_slice(), c.as_mut_slice(), n);
    Ok(())
}

pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, Error> {
    let mut c = Matrix::zeros(a.dim())?;
    multiply_into(a, b, &mut c)?;
    Ok(c)
}

/// Runs the benchmark workload: an `n`×`n` all-ones product.
///
/// Only the multiply is timed, not allocation or initialization.
pub fn run(n: usize) -> Result<Product, Error> {
    let a = Matrix::workload(n)?;
    let b = Matrix::workload(n)?;
    let mut c = Matrix::zeros(n)?;

    let watch = Stopwatch::start();
    multiply_into(&a, &b, &mut c)?;
    let elapsed = watch.elapsed();

    info!(n, elapsed = ?elapsed, "sequential multiply complete");
    Ok(Product { result: c, elapsed })
}

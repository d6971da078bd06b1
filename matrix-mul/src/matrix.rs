//! Square, row-major matrices of `f64`.

use std::ops::Range;

use crate::Error;

/// Value every element of the benchmark operands is set to.
pub const WORKLOAD_VALUE: f64 = 1.0;

/// An owned `n`×`n` matrix stored row-major in one flat buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Allocates an `n`×`n` matrix with every element set to `value`.
    pub fn filled(n: usize, value: f64) -> Result<Self, Error> {
        let data = alloc_filled(elements(n)?, value)?;
        Ok(Self { n, data })
    }

    pub fn zeros(n: usize) -> Result<Self, Error> {
        Self::filled(n, 0.0)
    }

    /// The benchmark operand: every element is [`WORKLOAD_VALUE`].
    pub fn workload(n: usize) -> Result<Self, Error> {
        Self::filled(n, WORKLOAD_VALUE)
    }

    /// Wraps an existing row-major buffer of `n * n` elements.
    pub fn from_vec(n: usize, data: Vec<f64>) -> Result<Self, Error> {
        let expected = elements(n)?;
        if data.len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { n, data })
    }

    /// Number of rows (and columns).
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// The elements of rows `range`, row-major.
    pub fn rows(&self, range: Range<usize>) -> &[f64] {
        &self.data[range.start * self.n..range.end * self.n]
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Number of elements of an `n`×`n` matrix, rejecting `n == 0`.
pub fn elements(n: usize) -> Result<usize, Error> {
    if n == 0 {
        return Err(Error::InvalidDimension(n.to_string()));
    }
    n.checked_mul(n)
        .ok_or_else(|| Error::InvalidDimension(n.to_string()))
}

/// Allocates `len` elements set to `value`, failing instead of aborting
/// when the allocator cannot satisfy the request.
pub fn alloc_filled(len: usize, value: f64) -> Result<Vec<f64>, Error> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure(len))?;
    data.resize(len, value);
    Ok(data)
}

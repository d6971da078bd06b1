//! The textbook triple-loop multiply.
//!
//! Every dot product accumulates `k = 0..n` in ascending order into a zero
//! accumulator, so any split of the rows across workers produces results
//! bit-identical to the single-threaded loop.

use crate::Error;

/// Computes `c_rows = a_rows × b` for a block of rows.
///
/// `a_rows` and `c_rows` hold the same number of rows of length `n`; `b` is
/// `n`×`n`.
pub fn multiply_rows(a_rows: &[f64], b: &[f64], c_rows: &mut [f64], n: usize) {
    debug_assert_eq!(a_rows.len(), c_rows.len());
    debug_assert_eq!(b.len(), n * n);

    for (a_row, c_row) in a_rows.chunks_exact(n).zip(c_rows.chunks_exact_mut(n)) {
        multiply_row(a_row, b, c_row, n);
    }
}

#[inline]
fn multiply_row(a_row: &[f64], b: &[f64], c_row: &mut [f64], n: usize) {
    for (j, c) in c_row.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (k, &a) in a_row.iter().enumerate() {
            sum += a * b[k * n + j];
        }
        *c = sum;
    }
}

/// Validates the buffers of a block multiply and returns its row count.
pub fn check_block(a_rows: &[f64], b: &[f64], c_rows: &[f64], n: usize) -> Result<usize, Error> {
    let b_len = crate::matrix::elements(n)?;
    if b.len() != b_len {
        return Err(Error::ShapeMismatch {
            expected: b_len,
            got: b.len(),
        });
    }
    if a_rows.len() % n != 0 || c_rows.len() != a_rows.len() {
        return Err(Error::ShapeMismatch {
            expected: a_rows.len() - a_rows.len() % n,
            got: c_rows.len(),
        });
    }
    Ok(a_rows.len() / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2x2() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];

        multiply_rows(&a, &b, &mut c, 2);

        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_overwrites_output() {
        let a = [1.0; 4];
        let b = [1.0; 4];
        let mut c = [99.0; 4];

        multiply_rows(&a, &b, &mut c, 2);

        assert_eq!(c, [2.0; 4]);
    }

    #[test]
    fn test_row_block() {
        // Second row of [[1,2],[3,4]] times [[5,6],[7,8]].
        let a = [3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 2];

        multiply_rows(&a, &b, &mut c, 2);

        assert_eq!(c, [43.0, 50.0]);
    }

    #[test]
    fn test_check_block() {
        let b = [0.0; 9];
        assert_eq!(check_block(&[0.0; 6], &b, &[0.0; 6], 3).unwrap(), 2);
        assert_eq!(check_block(&[], &b, &[], 3).unwrap(), 0);
        assert!(matches!(
            check_block(&[0.0; 6], &b, &[0.0; 3], 3),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            check_block(&[0.0; 6], &[0.0; 4], &[0.0; 6], 3),
            Err(Error::ShapeMismatch { expected: 9, got: 4 })
        ));
        assert!(matches!(
            check_block(&[], &[], &[], 0),
            Err(Error::InvalidDimension(_))
        ));
    }
}

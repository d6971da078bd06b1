//! Row-block decomposition of a matrix across distributed workers.

use std::ops::Range;

use crate::Error;

/// The contiguous rows `[start, end)` owned by one rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBlock {
    pub rank: usize,
    pub start: usize,
    pub end: usize,
}

impl RowBlock {
    /// The block of `rank` when `n` rows are split across `workers` ranks.
    ///
    /// Every rank gets `n / workers` rows; the last rank also takes the
    /// remainder, so it may own more rows than the others (or all of them
    /// when `n < workers`).
    pub fn for_rank(rank: usize, workers: usize, n: usize) -> Result<Self, Error> {
        if workers == 0 {
            return Err(Error::InvalidWorkerCount(workers.to_string()));
        }
        if rank >= workers {
            return Err(Error::RankOutOfRange { rank, workers });
        }

        let block = n / workers;
        let start = rank * block;
        let end = if rank == workers - 1 { n } else { start + block };
        Ok(Self { rank, start, end })
    }

    /// The blocks of all ranks, in rank order.
    pub fn partition(workers: usize, n: usize) -> Result<Vec<Self>, Error> {
        (0..workers.max(1))
            .map(|rank| Self::for_rank(rank, workers, n))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder_goes_to_last_rank() {
        let ranges: Vec<_> = RowBlock::partition(3, 10)
            .unwrap()
            .iter()
            .map(RowBlock::range)
            .collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_partition_covers_all_rows() {
        for n in 1..=20 {
            for workers in 1..=8 {
                let blocks = RowBlock::partition(workers, n).unwrap();
                assert_eq!(blocks.len(), workers);
                assert_eq!(blocks[0].start, 0);
                assert_eq!(blocks[workers - 1].end, n);
                for pair in blocks.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start, "n={n} workers={workers}");
                }
                assert_eq!(blocks.iter().map(RowBlock::len).sum::<usize>(), n);
            }
        }
    }

    #[test]
    fn test_fewer_rows_than_workers() {
        let blocks = RowBlock::partition(4, 1).unwrap();
        assert!(blocks[..3].iter().all(RowBlock::is_empty));
        assert_eq!(blocks[3].range(), 0..1);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            RowBlock::for_rank(0, 0, 4),
            Err(Error::InvalidWorkerCount(_))
        ));
        assert!(matches!(
            RowBlock::for_rank(2, 2, 4),
            Err(Error::RankOutOfRange { rank: 2, workers: 2 })
        ));
        assert!(RowBlock::partition(0, 4).is_err());
    }
}

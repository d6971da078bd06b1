//! A fixed-size pool of threads sharing an iteration space by a schedule.

use std::marker::PhantomData;
use std::ops::Range;
use std::thread;

use tracing::debug;

use crate::Error;
use crate::kernel;
use crate::schedule::{Dispatcher, Schedule};

/// Runs row loops on `threads` threads, distributing rows by `schedule`.
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    threads: usize,
    schedule: Schedule,
}

/// Rows processed by each thread of one pool run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub rows_per_worker: Vec<usize>,
}

impl PoolReport {
    pub fn total_rows(&self) -> usize {
        self.rows_per_worker.iter().sum()
    }
}

impl WorkerPool {
    pub fn new(threads: usize, schedule: Schedule) -> Result<Self, Error> {
        if threads == 0 {
            return Err(Error::InvalidThreadCount(threads.to_string()));
        }
        Ok(Self { threads, schedule })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Computes `c_rows = a_rows × b` with the rows shared among the threads.
    pub fn multiply(&self, a_rows: &[f64], b: &[f64], c_rows: &mut [f64], n: usize) -> Result<PoolReport, Error> {
        kernel::check_block(a_rows, b, c_rows, n)?;

        let report = self.for_each_rows(c_rows, n, |rows, c| {
            kernel::multiply_rows(&a_rows[rows.start * n..rows.end * n], b, c, n);
        });
        debug!(
            threads = self.threads,
            schedule = %self.schedule.policy(),
            chunk = self.schedule.chunk(),
            rows_per_worker = ?report.rows_per_worker,
            "pool run complete"
        );
        Ok(report)
    }

    /// Calls `body` once for every batch of rows of `out`, handing it the
    /// batch's row range and those rows.
    ///
    /// Returns after every batch has been processed. Threads beyond the row
    /// count are not started.
    pub fn for_each_rows<F>(&self, out: &mut [f64], row_len: usize, body: F) -> PoolReport
    where
        F: Fn(Range<usize>, &mut [f64]) + Sync,
    {
        let rows = if row_len == 0 { 0 } else { out.len() / row_len };
        if rows == 0 {
            return PoolReport::default();
        }

        let workers = self.threads.min(rows);
        let dispatcher = Dispatcher::new(self.schedule, rows, workers);

        if workers == 1 {
            for batch in dispatcher.claims(0) {
                let span = batch.start * row_len..batch.end * row_len;
                body(batch, &mut out[span]);
            }
            return PoolReport {
                rows_per_worker: vec![rows],
            };
        }

        let sink = RowSink::new(out, row_len);
        let rows_per_worker: Vec<usize> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let dispatcher = &dispatcher;
                    let sink = &sink;
                    let body = &body;
                    scope.spawn(move || {
                        let mut done = 0;
                        for batch in dispatcher.claims(worker) {
                            done += batch.len();
                            // SAFETY: the dispatcher hands every row to exactly one batch.
                            let rows = unsafe { sink.rows_mut(batch.clone()) };
                            body(batch, rows);
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        PoolReport { rows_per_worker }
    }
}

/// Shared access to disjoint row ranges of one output buffer.
struct RowSink<'a> {
    ptr: *mut f64,
    rows: usize,
    row_len: usize,
    _buf: PhantomData<&'a mut [f64]>,
}

// SAFETY: callers of `rows_mut` guarantee the ranges they hold never overlap.
unsafe impl Send for RowSink<'_> {}
unsafe impl Sync for RowSink<'_> {}

impl<'a> RowSink<'a> {
    fn new(buf: &'a mut [f64], row_len: usize) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            rows: buf.len() / row_len,
            row_len,
            _buf: PhantomData,
        }
    }

    /// # Safety
    ///
    /// No two slices returned by this method may be alive with overlapping
    /// ranges.
    #[allow(clippy::mut_from_ref)]
    unsafe fn rows_mut(&self, range: Range<usize>) -> &mut [f64] {
        assert!(range.start <= range.end && range.end <= self.rows);
        unsafe {
            std::slice::from_raw_parts_mut(
                self.ptr.add(range.start * self.row_len),
                range.len() * self.row_len,
            )
        }
    }
}

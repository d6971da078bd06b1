//! Argument parsing shared by the benchmark programs.

use std::process::ExitCode;

use crate::Error;

/// Parses a matrix dimension, accepting only positive integers.
pub fn parse_dimension(s: &str) -> Result<usize, Error> {
    parse_positive(s).ok_or_else(|| Error::InvalidDimension(s.to_string()))
}

pub fn parse_chunk_size(s: &str) -> Result<usize, Error> {
    parse_positive(s).ok_or_else(|| Error::InvalidChunkSize(s.to_string()))
}

pub fn parse_thread_count(s: &str) -> Result<usize, Error> {
    parse_positive(s).ok_or_else(|| Error::InvalidThreadCount(s.to_string()))
}

pub fn parse_worker_count(s: &str) -> Result<usize, Error> {
    parse_positive(s).ok_or_else(|| Error::InvalidWorkerCount(s.to_string()))
}

fn parse_positive(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

/// Exit status for an argument error: 0 for `--help`/`--version`, 1 for
/// usage errors. The message is printed only when `print` is set.
pub fn usage_exit(err: clap::Error, print: bool) -> ExitCode {
    if print {
        let _ = err.print();
    }
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Default thread count when none is configured.
pub fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_integers_only() {
        assert_eq!(parse_dimension("4").unwrap(), 4);
        assert_eq!(parse_chunk_size(" 16 ").unwrap(), 16);
        for bad in ["0", "-3", "abc", "", "2.5"] {
            assert!(matches!(parse_dimension(bad), Err(Error::InvalidDimension(_))), "{bad:?}");
        }
        assert!(matches!(parse_thread_count("0"), Err(Error::InvalidThreadCount(_))));
        assert!(matches!(parse_worker_count("x"), Err(Error::InvalidWorkerCount(_))));
    }

    #[test]
    fn test_available_threads() {
        assert!(available_threads() >= 1);
    }
}

//! Experiment records: `key=value` timing lines appended after each run.
//!
//! Keys follow the layout the plotting scripts read back:
//!
//! - `SEQ_<N>` for the sequential program,
//! - `OMP_<N>_<T>_<schedule>_total` for the shared-memory program,
//! - `<N>_<P>_<T>_<schedule>_{total,compute,comm}` for the hybrid program.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::Error;
use crate::schedule::SchedulePolicy;
use crate::timer::{self, PhaseTimings};

/// The timings of one run.
#[derive(Clone, Debug)]
pub enum Record {
    Sequential {
        n: usize,
        total: Duration,
    },
    Shared {
        n: usize,
        threads: usize,
        schedule: SchedulePolicy,
        total: Duration,
    },
    Hybrid {
        n: usize,
        workers: usize,
        threads: usize,
        schedule: SchedulePolicy,
        timings: PhaseTimings,
    },
}

impl Record {
    pub fn entries(&self) -> Vec<(String, Duration)> {
        match self {
            Self::Sequential { n, total } => vec![(format!("SEQ_{n}"), *total)],
            Self::Shared {
                n,
                threads,
                schedule,
                total,
            } => vec![(format!("OMP_{n}_{threads}_{schedule}_total"), *total)],
            Self::Hybrid {
                n,
                workers,
                threads,
                schedule,
                timings,
            } => {
                let prefix = format!("{n}_{workers}_{threads}_{schedule}");
                vec![
                    (format!("{prefix}_total"), timings.total),
                    (format!("{prefix}_compute"), timings.compute),
                    (format!("{prefix}_comm"), timings.comm),
                ]
            }
        }
    }
}

/// Appends `record` to the file at `path`, creating it if needed.
pub fn append(path: &Path, record: &Record) -> Result<(), Error> {
    let text: String = record
        .entries()
        .into_iter()
        .map(|(key, value)| format!("{key}={}\n", timer::secs(value)))
        .collect();

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// All timings found in a record file, by key. Later lines win.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentLog {
    entries: BTreeMap<String, f64>,
}

/// The parallel program a [`Speedup`] row was measured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Program {
    Shared,
    Hybrid,
}

impl Program {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "omp",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A parallel run compared against the sequential run of the same size.
///
/// Shared-memory runs count as one worker and carry no phase breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct Speedup {
    pub program: Program,
    pub n: usize,
    pub workers: usize,
    pub threads: usize,
    pub schedule: SchedulePolicy,
    pub total: f64,
    pub compute: Option<f64>,
    pub comm: Option<f64>,
    pub sequential: Option<f64>,
}

impl Speedup {
    pub fn speedup(&self) -> Option<f64> {
        self.sequential.map(|seq| seq / self.total)
    }

    /// Speedup per core used.
    pub fn efficiency(&self) -> Option<f64> {
        self.speedup()
            .map(|speedup| speedup / (self.workers * self.threads) as f64)
    }
}

impl ExperimentLog {
    pub fn load(path: &Path) -> Result<Self, Error> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Parses record lines, skipping blanks, `#` comments and lines whose
    /// value is not a number. A value such as `comm=0.12`, left behind by
    /// older collection scripts, yields its first number.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if let Some(value) = parse_value(value) {
                entries.insert(key.trim().to_string(), value);
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn sequential(&self, n: usize) -> Option<f64> {
        self.get(&format!("SEQ_{n}"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every shared-memory and hybrid run, ordered by size, program,
    /// schedule, ranks and threads.
    pub fn speedups(&self) -> Vec<Speedup> {
        let mut rows: Vec<Speedup> = self
            .entries
            .iter()
            .filter_map(|(key, &total)| self.speedup(key, total))
            .collect();

        rows.sort_by_key(|row| (row.n, row.program, row.schedule.as_str(), row.workers, row.threads));
        rows
    }

    fn speedup(&self, key: &str, total: f64) -> Option<Speedup> {
        let fields: Vec<&str> = key.split('_').collect();
        let (program, n, workers, threads, schedule) = match fields.as_slice() {
            ["OMP", n, threads, schedule, "total"] => (Program::Shared, n, "1", threads, schedule),
            [n, workers, threads, schedule, "total"] => (Program::Hybrid, n, *workers, threads, schedule),
            _ => return None,
        };
        let n = n.parse().ok()?;

        let (compute, comm) = match program {
            Program::Shared => (None, None),
            Program::Hybrid => {
                let prefix = key.strip_suffix("_total")?;
                (
                    self.get(&format!("{prefix}_compute")),
                    self.get(&format!("{prefix}_comm")),
                )
            }
        };

        Some(Speedup {
            program,
            n,
            workers: workers.parse().ok()?,
            threads: threads.parse().ok()?,
            schedule: schedule.parse().ok()?,
            total,
            compute,
            comm,
            sequential: self.sequential(n),
        })
    }
}

fn parse_value(value: &str) -> Option<f64> {
    let value = value.trim();
    if ["comm=", "compute=", "total="].iter().any(|tag| value.contains(tag)) {
        let start = value.find(|c: char| c.is_ascii_digit() || c == '.')?;
        let rest = &value[start..];
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        return rest[..end].parse().ok();
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid_entries() {
        let record = Record::Hybrid {
            n: 1024,
            workers: 2,
            threads: 4,
            schedule: SchedulePolicy::Static,
            timings: PhaseTimings {
                total: Duration::from_millis(1500),
                compute: Duration::from_millis(1400),
                comm: Duration::from_millis(100),
            },
        };
        let keys: Vec<String> = record.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["1024_2_4_static_total", "1024_2_4_static_compute", "1024_2_4_static_comm"]
        );
    }

    #[test]
    fn test_parse_tolerates_noise() {
        let log = ExperimentLog::parse(
            "# header\n\
             \n\
             SEQ_512=3.5\n\
             512_2_4_dynamic_total=comm=0.25\n\
             garbage line\n\
             512_2_4_dynamic_compute=n/a\n\
             512_2_4_guided_total = 1.75 \n",
        );

        assert_eq!(log.len(), 3);
        assert_eq!(log.sequential(512), Some(3.5));
        assert_eq!(log.get("512_2_4_dynamic_total"), Some(0.25));
        assert_eq!(log.get("512_2_4_guided_total"), Some(1.75));
        assert_eq!(log.get("512_2_4_dynamic_compute"), None);
    }

    #[test]
    fn test_speedups() {
        let log = ExperimentLog::parse(
            "SEQ_100=8.0\n\
             100_2_2_static_total=2.0\n\
             100_2_2_static_compute=1.5\n\
             100_2_2_static_comm=0.5\n\
             100_1_2_static_total=4.0\n\
             OMP_100_4_static_total=2.5\n\
             200_1_1_guided_total=1.0\n",
        );

        let rows = log.speedups();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].program, Program::Shared);
        assert_eq!((rows[0].workers, rows[0].threads), (1, 4));
        assert_eq!(rows[0].speedup(), Some(3.2));
        assert_eq!((rows[0].compute, rows[0].comm), (None, None));

        assert_eq!(rows[1].program, Program::Hybrid);
        assert_eq!((rows[1].workers, rows[1].speedup()), (1, Some(2.0)));
        assert_eq!((rows[1].compute, rows[1].comm), (None, None));

        assert_eq!((rows[2].workers, rows[2].speedup()), (2, Some(4.0)));
        assert_eq!(rows[2].efficiency(), Some(1.0));
        assert_eq!((rows[2].compute, rows[2].comm), (Some(1.5), Some(0.5)));

        assert_eq!(rows[3].n, 200);
        assert_eq!(rows[3].speedup(), None);
    }

    #[test]
    fn test_speedups_skip_malformed_keys() {
        let log = ExperimentLog::parse(
            "OMP_100_x_static_total=1.0\n\
             100_2_2_bogus_total=1.0\n\
             OMP_100_4_static_compute=1.0\n",
        );
        assert!(log.speedups().is_empty());
    }
}

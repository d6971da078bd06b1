use std::path::PathBuf;
use std::process::{Command, Output};

use matrix_mul::record::ExperimentLog;

fn run(program: &str, args: &[&str]) -> Output {
    Command::new(program)
        .args(args)
        .env_remove("MATMUL_RANK")
        .env_remove("MATMUL_WORLD_SIZE")
        .env_remove("MATMUL_COORDINATOR_ADDR")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn temp_record(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("matmul-{}-{}.txt", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

const SEQ: &str = env!("CARGO_BIN_EXE_seq-matmul");
const OMP: &str = env!("CARGO_BIN_EXE_omp-matmul");
const HYBRID: &str = env!("CARGO_BIN_EXE_hybrid-matmul");
const LAUNCH: &str = env!("CARGO_BIN_EXE_matmul-launch");
const REPORT: &str = env!("CARGO_BIN_EXE_matmul-report");

#[test]
fn test_sequential_prints_timing() {
    let output = run(SEQ, &["8"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("Sequential time: "));
}

#[test]
fn test_missing_arguments_exit_1() {
    for program in [SEQ, OMP, HYBRID] {
        let output = run(program, &[]);
        assert_eq!(output.status.code(), Some(1), "{program}");
        assert!(stdout(&output).is_empty());
    }
    assert_eq!(run(HYBRID, &["8", "static"]).status.code(), Some(1));
}

#[test]
fn test_invalid_dimension_exit_1() {
    for n in ["0", "-4", "abc"] {
        assert_eq!(run(SEQ, &[n]).status.code(), Some(1), "{n}");
    }
}

#[test]
fn test_shared_prints_timing_per_schedule() {
    for schedule in ["static", "dynamic", "guided"] {
        let output = run(OMP, &["16", schedule, "2", "--threads", "3"]);
        assert!(output.status.success(), "{schedule}");
        assert!(stdout(&output).starts_with(&format!("OpenMP {schedule} time: ")));
    }
}

#[test]
fn test_bogus_schedule_exit_1() {
    let output = run(OMP, &["8", "bogus"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout(&output).contains("time:"));
    let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
    assert!(stderr.contains("invalid schedule type"), "{stderr}");

    let output = run(HYBRID, &["8", "bogus", "2"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout(&output).contains("Hybrid"));
}

#[test]
fn test_hybrid_single_process() {
    let output = run(HYBRID, &["12", "guided", "2"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("Hybrid N=12 P=1 T=2 schedule=guided: total="));
}

#[test]
fn test_launch_hybrid_ranks() {
    let record = temp_record("launch");
    let record_arg = record.to_str().unwrap();
    let output = run(
        LAUNCH,
        &["-n", "3", HYBRID, "10", "dynamic", "2", "1", "--record", record_arg],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1, "only rank 0 reports: {out}");
    assert!(lines[0].starts_with("Hybrid N=10 P=3 T=2 schedule=dynamic: total="));

    let log = ExperimentLog::load(&record).unwrap();
    assert!(log.get("10_3_2_dynamic_total").is_some());
    assert!(log.get("10_3_2_dynamic_compute").is_some());
    assert!(log.get("10_3_2_dynamic_comm").is_some());
    let _ = std::fs::remove_file(&record);
}

#[test]
fn test_launch_propagates_failure() {
    let output = run(LAUNCH, &["-n", "2", HYBRID, "10", "bogus", "2"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout(&output).contains("Hybrid"));
}

#[test]
fn test_record_and_report() {
    let record = temp_record("report");
    let record_arg = record.to_str().unwrap();

    assert!(run(SEQ, &["8", "--record", record_arg]).status.success());
    assert!(run(OMP, &["8", "guided", "1", "--threads", "2", "--record", record_arg]).status.success());
    assert!(run(HYBRID, &["8", "static", "1", "--record", record_arg]).status.success());

    let log = ExperimentLog::load(&record).unwrap();
    assert!(log.sequential(8).is_some());
    assert!(log.get("OMP_8_2_guided_total").is_some());
    assert!(log.get("8_1_1_static_total").is_some());

    let output = run(REPORT, &[record_arg]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("N=8 sequential="), "{out}");
    assert!(out.contains("compute"), "{out}");

    let row = |program: &str| -> Vec<String> {
        out.lines()
            .find(|line| line.starts_with(program))
            .unwrap_or_else(|| panic!("no {program} row in {out}"))
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };

    // program P T schedule total compute comm speedup efficiency
    let omp = row("omp ");
    assert_eq!(omp.len(), 9, "{out}");
    assert_eq!(&omp[1..4], ["-", "2", "guided"]);
    assert_eq!(&omp[5..7], ["-", "-"]);
    assert_ne!(omp[7], "-");

    let hybrid = row("hybrid ");
    assert_eq!(hybrid.len(), 9, "{out}");
    assert_eq!(&hybrid[1..4], ["1", "1", "static"]);
    assert!(hybrid[5].parse::<f64>().is_ok(), "{out}");
    assert!(hybrid[6].parse::<f64>().is_ok(), "{out}");
    assert_ne!(hybrid[7], "-");

    let _ = std::fs::remove_file(&record);
}

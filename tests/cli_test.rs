// bounded_queues/tests/cli_test.rs

use std::process::{Command, Output};


fn run_cli(args: &[&str]) -> Output {
   Command::new(env!("CARGO_BIN_EXE_producer_consumers"))
      .args(args)
      .env_remove("RUST_LOG")
      .output()
      .expect("failed to launch producer_consumers")
}

fn stdout(out: &Output) -> String {
   String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
   String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_cli_default_run_prints_ok_line() {
   let out = run_cli(&["4", "100", "--delay-us", "0"]);
   assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
   let text = stdout(&out);
   assert!(
      text.contains("consumers=4 producers=1 items=100 total=4950 expected=4950 OK"),
      "unexpected output: {}",
      text
   );
}

#[test]
fn test_cli_multiple_producers() {
   let out = run_cli(&["2", "10", "--producers", "3", "--capacity", "8", "--delay-us", "0"]);
   assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
   assert!(stdout(&out).contains("consumers=2 producers=3 items=10 total=135 expected=135 OK"));
}

#[test]
fn test_cli_zero_items() {
   let out = run_cli(&["1", "0", "--capacity", "1", "--delay-us", "0"]);
   assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
   assert!(stdout(&out).contains("total=0 expected=0 OK"));
}

#[test]
fn test_cli_zero_consumers_exits_one() {
   let out = run_cli(&["0", "10", "--delay-us", "0"]);
   assert_eq!(out.status.code(), Some(1));
   assert!(stderr(&out).contains("consumers must be greater than zero"));
   assert!(!stdout(&out).contains("total="));
}

#[test]
fn test_cli_negative_items_exits_one() {
   let out = run_cli(&["4", "-5", "--delay-us", "0"]);
   assert_eq!(out.status.code(), Some(1), "stderr: {}", stderr(&out));
   assert!(stderr(&out).contains("items must be non-negative"), "stderr: {}", stderr(&out));
}

#[test]
fn test_cli_zero_capacity_exits_one() {
   let out = run_cli(&["4", "10", "--capacity", "0", "--delay-us", "0"]);
   assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_cli_bad_arguments_exit_one() {
   for args in [&["4", "10", "extra"][..], &["4", "abc"][..], &["--no-such-flag"][..]] {
      let out = run_cli(args);
      assert_eq!(out.status.code(), Some(1), "args {:?}, stderr: {}", args, stderr(&out));
   }
}

#[test]
fn test_cli_help_and_version_exit_zero() {
   for flag in ["--help", "--version"] {
      let out = run_cli(&[flag]);
      assert_eq!(out.status.code(), Some(0), "{} stderr: {}", flag, stderr(&out));
      assert!(!stdout(&out).is_empty());
   }
}

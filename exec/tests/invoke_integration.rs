//! Integration tests for argv-shim-exec.
//!
//! `/bin/sh` stands in for the wrapped executable: every test passes
//! `-c <script>` as the leading arguments.

#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use argv_shim_exec::schema::{OptionRule, Options, OptionsSchema};
use argv_shim_exec::{BinaryPath, ExecError, Invoker, Mode};
use serde_json::json;

const SHELL: &str = "/bin/sh";

fn shell() -> Invoker {
    Invoker::new(BinaryPath::new(SHELL))
}

fn opts(value: serde_json::Value) -> Options {
    value.as_object().cloned().expect("options must be an object")
}

#[test]
fn captured_returns_stdout_verbatim() {
    let output = shell().capture(&["-c", "printf 'ok\\n'"]).unwrap();
    assert_eq!(output, "ok\n");
}

#[test]
fn captured_keeps_embedded_newlines() {
    let output = shell()
        .execute(&["-c", "printf 'a\\n\\nb\\n'"], Mode::Captured)
        .unwrap();
    assert_eq!(output, "a\n\nb\n");
}

#[test]
fn captured_does_not_mix_stderr_into_stdout() {
    let output = shell()
        .capture(&["-c", "printf out; printf err >&2"])
        .unwrap();
    assert_eq!(output, "out");
}

#[test]
fn captured_nonzero_exit_is_error_with_code() {
    let err = shell()
        .capture(&["-c", "printf partial; printf 'boom\\n' >&2; exit 1"])
        .unwrap_err();

    match &err {
        ExecError::ProcessExecution {
            code,
            stdout,
            stderr,
            path,
        } => {
            assert_eq!(*code, Some(1));
            assert_eq!(stdout, "partial");
            assert_eq!(stderr, "boom\n");
            assert_eq!(path, Path::new(SHELL));
        }
        other => panic!("expected ProcessExecution, got {other:?}"),
    }
    assert_eq!(err.exit_code(), Some(1));
}

#[test]
fn captured_reports_other_exit_codes() {
    let err = shell().capture(&["-c", "exit 42"]).unwrap_err();
    assert_eq!(err.exit_code(), Some(42));
}

// Live mode resolves even when the child fails. Callers depend on this, so
// it must not start surfacing the exit status.
#[test]
fn live_nonzero_exit_is_not_an_error() {
    let result = shell().execute(&["-c", "exit 1"], Mode::Live);
    assert_eq!(result.unwrap(), "");

    shell().live(&["-c", "exit 3"]).unwrap();
}

#[test]
fn live_waits_for_child_exit() {
    let started = Instant::now();
    shell().live(&["-c", "sleep 0.2"]).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[test]
fn child_inherits_environment() {
    // PATH is always set for the test harness.
    let expected = std::env::var("PATH").unwrap();
    let output = shell().capture(&["-c", "printf '%s' \"$PATH\""]).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn arguments_are_not_shell_interpreted() {
    let output = shell()
        .capture(&["-c", "printf '%s|' \"$@\"", "sh", "a b", "$HOME", "*;"])
        .unwrap();
    assert_eq!(output, "a b|$HOME|*;|");
}

#[test]
fn missing_binary_is_spawn_error() {
    let invoker = Invoker::new(BinaryPath::new("/nonexistent/argv-shim-test-binary"));
    let err = invoker.capture(&["--version"]).unwrap_err();
    assert!(err.is_spawn_error());
    assert!(matches!(
        &err,
        ExecError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
    ));
}

#[test]
fn non_executable_binary_is_spawn_error() {
    // A directory exists but cannot be executed.
    let invoker = Invoker::new(BinaryPath::new(std::env::temp_dir()));
    let err = invoker.capture(&["--version"]).unwrap_err();
    assert!(err.is_spawn_error(), "unexpected error: {err}");
}

#[test]
fn overriding_path_redirects_later_calls_only() {
    let mut invoker = Invoker::new(BinaryPath::new("/nonexistent/argv-shim-test-binary"));
    let before = invoker.capture(&["-c", "printf first"]);
    assert!(before.as_ref().unwrap_err().is_spawn_error());

    invoker.set_binary_path(SHELL);
    let after = invoker.capture(&["-c", "printf second"]).unwrap();
    assert_eq!(after, "second");
    // The earlier failure is untouched by the override.
    assert!(before.unwrap_err().is_spawn_error());

    invoker.set_binary_path("/nonexistent/argv-shim-test-binary");
    assert!(invoker.capture(&["-c", "true"]).unwrap_err().is_spawn_error());
}

#[test]
fn run_prepares_command_and_options() {
    let schema = OptionsSchema::new()
        .with_rule("tags", OptionRule::array("--tag"))
        .with_rule("dry", OptionRule::boolean("--dry-run"));
    let options = opts(json!({"tags": ["a", "b"], "dry": true}));

    let output = shell()
        .run(
            ["-c", "printf '%s ' \"$@\"", "sh"],
            &schema,
            &options,
            Mode::Captured,
        )
        .unwrap();
    assert_eq!(output, "--tag a --tag b --dry-run ");
}

#[test]
fn run_rejects_invalid_option_before_spawning() {
    // The binary does not exist; an invalid option must fail first.
    let invoker = Invoker::new(BinaryPath::new("/nonexistent/argv-shim-test-binary"));
    let schema = OptionsSchema::new().with_rule("tags", OptionRule::array("--tag"));
    let options = opts(json!({"tags": "not-an-array"}));

    let err = invoker
        .run(["releases", "new"], &schema, &options, Mode::Captured)
        .unwrap_err();
    match err {
        ExecError::InvalidOption(inner) => assert_eq!(inner.option(), "tags"),
        other => panic!("expected InvalidOption, got {other:?}"),
    }
}

#[test]
fn timeout_kills_hung_child() {
    let invoker = shell().with_timeout(Duration::from_millis(100));
    let started = Instant::now();
    let err = invoker.capture(&["-c", "exec sleep 5"]).unwrap_err();

    assert!(matches!(err, ExecError::Timeout { .. }), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn timeout_covers_output_held_open_by_grandchild() {
    let invoker = shell().with_timeout(Duration::from_millis(200));
    let started = Instant::now();
    let err = invoker.capture(&["-c", "sleep 3 & printf ok"]).unwrap_err();

    assert!(matches!(err, ExecError::Timeout { .. }), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn grandchild_holding_output_is_awaited_without_timeout() {
    let started = Instant::now();
    let output = shell().capture(&["-c", "sleep 1 & printf ok"]).unwrap();

    assert_eq!(output, "ok");
    assert!(started.elapsed() >= Duration::from_millis(900));
}

#[test]
fn timeout_does_not_affect_fast_children() {
    let invoker = shell().with_timeout(Duration::from_secs(10));
    assert_eq!(invoker.capture(&["-c", "printf fast"]).unwrap(), "fast");
}

#[test]
fn concurrent_calls_are_independent() {
    let invoker = shell();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            invoker.spawn_execute(
                vec!["-c".to_string(), format!("printf {i}")],
                Mode::Captured,
            )
        })
        .collect();

    let outputs: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked").unwrap())
        .collect();
    assert_eq!(outputs, vec!["0", "1", "2", "3"]);
}

#[test]
fn large_output_does_not_deadlock() {
    let output = shell()
        .capture(&["-c", "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done"])
        .unwrap();
    assert_eq!(output.lines().count(), 20000);
    assert!(output.ends_with("line-19999\n"));
}

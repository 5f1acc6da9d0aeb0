#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout, ScratchProject};

use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Handle;

use bundlewatch::engine::{CommandIdentity, CommandScheduler, RunPhase};
use bundlewatch::exec::{run_command, TokioProcessRunner};
use bundlewatch::fs::RealFileSystem;
use bundlewatch::sink::{LineKind, MemorySink, SinkEvent};

#[tokio::test]
async fn output_and_diagnostics_reach_the_sink() {
    init_tracing();
    let project = ScratchProject::new(&[]);
    let source = project.write("content/site.less", ".a { color: red }");
    let script = project.script(
        "bundler-less.cmd",
        &format!(
            "echo compiling\n\
             printf '\\033[31mParseError: Unrecognised input in {} on line 7, column 3:\\033[39m\\n' >&2\n\
             echo 'ParseError: nope in /does/not/exist.less on line 1, column 1:' >&2\n\
             echo 'something else' >&2\n\
             exit 3",
            source.display()
        ),
    );

    let sink = MemorySink::new();
    let cmd = CommandIdentity::new(script.clone());
    let status = with_timeout(run_command(&cmd, &sink, &RealFileSystem))
        .await
        .expect("command should start");

    assert_eq!(status.code(), Some(3));
    assert_eq!(sink.lines(LineKind::Output), vec!["compiling".to_string()]);

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].file_path, source);
    assert_eq!(diagnostics[0].line, 7);
    assert_eq!(diagnostics[0].message, "Unrecognised input");

    let errors = sink.lines(LineKind::Error);
    assert_eq!(
        errors,
        vec![
            "ParseError: nope in /does/not/exist.less on line 1, column 1:".to_string(),
            "something else".to_string(),
        ]
    );

    let info = sink.lines(LineKind::Info);
    let expected_start = format!("Running \"{}\"", script.display());
    assert_eq!(info.first(), Some(&expected_start));
    assert!(info.last().unwrap().contains("exit code 3"));
}

#[tokio::test]
async fn command_runs_in_its_own_directory() {
    init_tracing();
    let project = ScratchProject::new(&[]);
    let script = project.script("bundler.cmd", "pwd");

    let sink = MemorySink::new();
    let cmd = CommandIdentity::new(script.clone());
    with_timeout(run_command(&cmd, &sink, &RealFileSystem)).await;

    let out = sink.lines(LineKind::Output);
    assert_eq!(out.len(), 1);
    assert_eq!(Path::new(&out[0]).canonicalize().unwrap(), project.root.join("bundler"));
}

#[tokio::test]
async fn missing_command_is_reported_and_returns_to_idle() {
    init_tracing();
    let project = ScratchProject::new(&[]);
    let missing = project.command("bundler.cmd");

    let sink = Arc::new(MemorySink::new());
    let runner = TokioProcessRunner::new(Handle::current(), sink.clone(), Arc::new(RealFileSystem));
    let scheduler = CommandScheduler::new(Arc::new(runner));

    let cmd = CommandIdentity::new(missing);
    scheduler.trigger(cmd.clone());
    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(scheduler.phase_of(&cmd), Some(RunPhase::Idle));
    let errors = sink.lines(LineKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("failed to start"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saves_during_a_real_run_coalesce_into_one_rerun() {
    init_tracing();
    let project = ScratchProject::new(&[]);
    let script = project.script("bundler.cmd", "sleep 0.3\necho done");

    let sink = Arc::new(MemorySink::new());
    let runner = TokioProcessRunner::new(Handle::current(), sink.clone(), Arc::new(RealFileSystem));
    let scheduler = CommandScheduler::new(Arc::new(runner));

    let cmd = CommandIdentity::new(script);
    for _ in 0..5 {
        scheduler.trigger(cmd.clone());
    }
    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(scheduler.runs_started(&cmd), 2);
    assert_eq!(sink.lines(LineKind::Output), vec!["done".to_string(), "done".to_string()]);
    let finished = sink
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e,
                SinkEvent::Line { kind: LineKind::Info, text } if text.starts_with("Finished")
            )
        })
        .count();
    assert_eq!(finished, 2);
}

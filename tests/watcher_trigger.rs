mod common;
use crate::common::fake_runner::FakeProcessRunner;
use crate::common::{init_tracing, with_timeout, ScratchProject};

use std::sync::Arc;
use std::time::Duration;

use bundlewatch::config::ConfigFile;
use bundlewatch::engine::{CommandIdentity, CommandScheduler, TriggerDecision};
use bundlewatch::fs::RealFileSystem;
use bundlewatch::types::ChangeReason;
use bundlewatch::watch::{process_file_change, spawn_watcher, CommandResolver, FileHashCache};

fn resolver_for(project: &ScratchProject) -> Arc<CommandResolver> {
    Arc::new(
        CommandResolver::new(&ConfigFile::default(), &project.root, Arc::new(RealFileSystem))
            .unwrap(),
    )
}

async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cond()
}

#[tokio::test]
async fn saving_an_asset_triggers_its_command() {
    init_tracing();
    let project = ScratchProject::new(&["bundler.cmd", "bundler-less.cmd"]);

    let resolver = resolver_for(&project);
    let runner = Arc::new(FakeProcessRunner::new());
    let scheduler = CommandScheduler::new(runner.clone());

    let _watcher = spawn_watcher(resolver, scheduler.clone()).unwrap();
    // Give the backend a moment to register the watch.
    tokio::time::sleep(Duration::from_millis(200)).await;

    project.write("content/site.less", ".a { color: red }");
    project.write("bundler/out.css", "generated");

    let less = CommandIdentity::new(project.command("bundler-less.cmd"));
    assert!(wait_until(|| runner.starts_of(&less) > 0).await);

    // Output written into the tooling directory never starts anything.
    let css = CommandIdentity::new(project.command("bundler-css.cmd"));
    let default = CommandIdentity::new(project.command("bundler.cmd"));
    assert_eq!(runner.starts_of(&css), 0);
    assert_eq!(runner.starts_of(&default), 0);
}

#[test]
fn identical_rewrite_is_not_a_change() {
    init_tracing();
    let project = ScratchProject::new(&["bundler.cmd"]);
    let resolver = resolver_for(&project);
    let runner = Arc::new(FakeProcessRunner::new());
    let scheduler = CommandScheduler::new(runner.clone());
    let mut hashes = FileHashCache::new();

    let css = project.write("content/site.css", ".a{color:red}");
    assert_eq!(
        process_file_change(&resolver, &scheduler, &mut hashes, &css, ChangeReason::Added),
        Some(TriggerDecision::Launch { run_id: 1 })
    );
    runner.complete_all();

    project.write("content/site.css", ".a{color:red}");
    assert_eq!(
        process_file_change(&resolver, &scheduler, &mut hashes, &css, ChangeReason::Saved),
        None
    );

    project.write("content/site.css", ".a{color:blue}");
    assert_eq!(
        process_file_change(&resolver, &scheduler, &mut hashes, &css, ChangeReason::Saved),
        Some(TriggerDecision::Launch { run_id: 2 })
    );
}

/// A build that rewrites its output next to the sources with the same bytes
/// settles instead of rebuilding forever.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn build_rewriting_its_own_output_settles() {
    use bundlewatch::exec::TokioProcessRunner;
    use bundlewatch::sink::MemorySink;
    use tokio::runtime::Handle;

    init_tracing();
    let project = ScratchProject::new(&[]);
    let script = project.script("bundler.cmd", "echo '.a{color:red}' > ../content/site.css");

    let resolver = resolver_for(&project);
    let runner = TokioProcessRunner::new(
        Handle::current(),
        Arc::new(MemorySink::new()),
        Arc::new(RealFileSystem),
    );
    let scheduler = CommandScheduler::new(Arc::new(runner));

    let _watcher = spawn_watcher(resolver, scheduler.clone()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    project.write("content/site.less", ".a { color: red }");

    let cmd = CommandIdentity::new(script);
    assert!(wait_until(|| scheduler.runs_started(&cmd) > 0).await);
    tokio::time::sleep(Duration::from_secs(3)).await;
    with_timeout(scheduler.wait_idle()).await;

    let runs = scheduler.runs_started(&cmd);
    assert!(runs <= 2, "one save produced {runs} runs");
}

// ABOUTME: Integration tests for the prerequisite checker.
// ABOUTME: Covers first-missing-tool ordering and the production config requirement.

mod support;

use deckhand::config::{Environment, RunOptions, TargetKind};
use deckhand::exec::Invocation;
use deckhand::prereq::{PrereqError, PrerequisiteChecker, Tool};
use proptest::prelude::*;
use support::{FakeRunner, Reply, run_config};

fn tool(name: &str) -> Tool {
    Tool::new(name, Invocation::new(name).arg("--version"))
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn tool_missing_names_first_absent_tool(available in proptest::collection::vec(any::<bool>(), 1..8)) {
        let names: Vec<String> = (0..available.len()).map(|i| format!("tool{}", i)).collect();
        let mut runner = FakeRunner::new();
        for (name, present) in names.iter().zip(&available) {
            if !present {
                runner = runner.on(name, &["--version"], Reply::Missing);
            }
        }
        let tools = names.iter().map(|n| tool(n)).collect();

        let result = block_on(PrerequisiteChecker::new(&runner, tools).check());

        match available.iter().position(|present| !present) {
            Some(first) => {
                prop_assert_eq!(result, Err(PrereqError::ToolMissing(names[first].clone())));
                // Nothing after the first missing tool is probed
                prop_assert_eq!(runner.calls().len(), first + 1);
            }
            None => {
                prop_assert_eq!(result, Ok(()));
                prop_assert_eq!(runner.calls().len(), names.len());
            }
        }
    }
}

#[tokio::test]
async fn failing_version_query_counts_as_missing() {
    let runner = FakeRunner::new().on("kubectl", &["version"], Reply::fail(1, "error"));
    let tools = vec![Tool::docker(), Tool::kubectl()];

    let err = PrerequisiteChecker::new(&runner, tools)
        .check()
        .await
        .unwrap_err();

    assert_eq!(err, PrereqError::ToolMissing("kubectl".to_string()));
}

#[tokio::test]
async fn local_target_probes_compose_not_kubectl() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env.production"), "KEY=value\n").unwrap();
    let config = run_config(
        dir.path(),
        RunOptions {
            target: TargetKind::Local,
            ..RunOptions::default()
        },
    );
    let runner = FakeRunner::new();

    PrerequisiteChecker::for_config(&config, &runner)
        .check()
        .await
        .unwrap();

    assert_eq!(runner.count("docker", &["compose", "version"]), 1);
    assert_eq!(runner.count("kubectl", &[]), 0);
}

#[tokio::test]
async fn production_requires_config_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = run_config(dir.path(), RunOptions::default());
    let runner = FakeRunner::new();

    let err = PrerequisiteChecker::for_config(&config, &runner)
        .check()
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PrereqError::ConfigMissing(dir.path().join(".env.production"))
    );
}

#[tokio::test]
async fn staging_skips_config_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = run_config(
        dir.path(),
        RunOptions {
            environment: Environment::Staging,
            ..RunOptions::default()
        },
    );
    let runner = FakeRunner::new();

    assert!(
        PrerequisiteChecker::for_config(&config, &runner)
            .check()
            .await
            .is_ok()
    );
}

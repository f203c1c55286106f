#![cfg(all(test, unix))]
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sebat_common::config::{Config, Rescan, RunDate, SkipMode};
use sebat_common::scan::pipeline::Workflow;
use sebat_common::scan::target::{self, Target};
use sebat_core::context::RunContext;
use sebat_core::executor::StepExecutor;
use sebat_core::results;
use sebat_core::scheduler::{RunSummary, Scheduler};
use sebat_integration_tests::CountingExecutor;

const DATE: &str = "2024-05-01";

const PROBE_WORKFLOW: &str = r#"
name: probe
pipeline:
  - name: probe
    command: "echo {domain} > {output_file}"
"#;

const CHAINED_WORKFLOW: &str = r#"
name: chained
description: second step reads the first one's output
pipeline:
  - name: hosts
    category: recon
    output_file: hosts.txt
    command: "echo {domain} > {output_file}"
  - name: upper
    cat_base: recon
    command: "tr a-z A-Z < {hosts.output_file} > {output_file}"
"#;

fn config(root: &Path) -> Config {
    Config {
        results_root: root.to_path_buf(),
        batch_size: 2,
        run_date: DATE.parse().unwrap(),
        ..Config::default()
    }
}

async fn run_workflow(
    yaml: &str,
    targets: &[Target],
    cfg: &Config,
    executor: Arc<CountingExecutor>,
) -> RunSummary {
    let workflow: Workflow = Workflow::from_yaml(yaml, "fallback").unwrap();
    let executor: Arc<dyn StepExecutor> = executor;
    let scheduler = Scheduler::new(
        workflow.name.clone(),
        targets.to_vec(),
        Arc::new(workflow.pipeline),
        Arc::new(RunContext::from_config(cfg)),
        executor,
        cfg.batch_size,
    );

    let summary: RunSummary = scheduler.run().await.unwrap();
    let counts = scheduler.board().counts();
    assert_eq!(counts.finished(), counts.total(), "board left unfinished pairs");
    summary
}

fn read(path: PathBuf) -> String {
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// A domain and a CIDR block go through a one-step workflow; the second run
/// on the same date launches nothing.
#[tokio::test]
async fn probe_runs_once_per_date() {
    let root = tempfile::tempdir().unwrap();
    let cfg: Config = config(root.path());
    let targets: Vec<Target> = target::parse_list("example.com\n# skipped\n10.0.0.0/24\n");
    assert_eq!(targets.len(), 2);

    let executor = Arc::new(CountingExecutor::default());
    let first: RunSummary = run_workflow(PROBE_WORKFLOW, &targets, &cfg, executor.clone()).await;

    assert_eq!(first.workflow, "probe");
    assert_eq!(first.batches, 1);
    assert_eq!(first.executed(), 2);
    assert_eq!(first.failed(), 0);
    assert_eq!(executor.launches(), 2);

    let cidr_output: PathBuf = root.path().join("10.0.0.0-24/probe/scan-at-2024-05-01");
    assert_eq!(read(cidr_output), "10.0.0.0/24\n");
    let domain_output: PathBuf = root.path().join("example.com/probe/scan-at-2024-05-01");
    assert_eq!(read(domain_output), "example.com\n");

    let second: RunSummary = run_workflow(PROBE_WORKFLOW, &targets, &cfg, executor.clone()).await;
    assert_eq!(second.skipped(), 2);
    assert_eq!(second.executed(), 0);
    assert_eq!(executor.launches(), 2);
}

#[tokio::test]
async fn later_step_reads_earlier_output() {
    let root = tempfile::tempdir().unwrap();
    let cfg: Config = config(root.path());
    let targets: Vec<Target> = target::parse_list("a.example\nb.example\nc.example\n");

    let executor = Arc::new(CountingExecutor::default());
    let summary: RunSummary = run_workflow(CHAINED_WORKFLOW, &targets, &cfg, executor.clone()).await;

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.executed(), 6);
    assert_eq!(summary.failed(), 0);

    for name in ["a.example", "b.example", "c.example"] {
        let hosts: PathBuf = root
            .path()
            .join(name)
            .join("recon/hosts/scan-at-2024-05-01-hosts.txt");
        assert_eq!(read(hosts), format!("{name}\n"));

        let upper: PathBuf = root.path().join(name).join("recon/upper/scan-at-2024-05-01");
        assert_eq!(read(upper), format!("{}\n", name.to_uppercase()));
    }
}

#[tokio::test]
async fn rescan_steps_reruns_only_named_steps() {
    let root = tempfile::tempdir().unwrap();
    let targets: Vec<Target> = target::parse_list("example.com\n");
    let executor = Arc::new(CountingExecutor::default());

    let cfg: Config = config(root.path());
    run_workflow(CHAINED_WORKFLOW, &targets, &cfg, executor.clone()).await;
    assert_eq!(executor.launches(), 2);

    let rescan_cfg = Config {
        rescan: Rescan::Steps(BTreeSet::from(["upper".to_string()])),
        ..config(root.path())
    };
    let summary: RunSummary = run_workflow(CHAINED_WORKFLOW, &targets, &rescan_cfg, executor.clone()).await;

    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.executed(), 1);
    assert_eq!(executor.launches(), 3);
}

#[tokio::test]
async fn reuse_any_skips_output_from_another_date() {
    let root = tempfile::tempdir().unwrap();
    let targets: Vec<Target> = target::parse_list("example.com\n");
    let executor = Arc::new(CountingExecutor::default());

    run_workflow(PROBE_WORKFLOW, &targets, &config(root.path()), executor.clone()).await;

    let next_day = Config {
        run_date: "2024-05-02".parse().unwrap(),
        skip_mode: SkipMode::AnyResult,
        ..config(root.path())
    };
    let summary: RunSummary = run_workflow(PROBE_WORKFLOW, &targets, &next_day, executor.clone()).await;
    assert_eq!(summary.skipped(), 1);

    let exact = Config {
        run_date: "2024-05-02".parse().unwrap(),
        ..config(root.path())
    };
    let summary: RunSummary = run_workflow(PROBE_WORKFLOW, &targets, &exact, executor.clone()).await;
    assert_eq!(summary.executed(), 1);
    assert_eq!(executor.launches(), 2);
}

#[tokio::test]
async fn results_index_finds_what_a_run_wrote() {
    let root = tempfile::tempdir().unwrap();
    let cfg: Config = config(root.path());
    let targets: Vec<Target> = target::parse_list("example.com\n10.0.0.0/24\n");

    run_workflow(CHAINED_WORKFLOW, &targets, &cfg, Arc::new(CountingExecutor::default())).await;

    let date: RunDate = DATE.parse().unwrap();
    assert_eq!(results::latest_run_date(root.path()).unwrap(), Some(date.clone()));

    let files = results::collect(root.path(), &date).unwrap();
    assert_eq!(files.len(), 4);
    assert_eq!(files[0].target, "10.0.0.0-24");
    assert_eq!(files[0].location, PathBuf::from("recon/hosts"));
    assert!(files.iter().all(|file| file.size > 0));
}

#[tokio::test]
async fn dotted_step_name_is_referenced_without_spaces() {
    let root = tempfile::tempdir().unwrap();
    let cfg: Config = config(root.path());
    let targets: Vec<Target> = target::parse_list("example.com\n");
    let yaml: &str = r#"
pipeline:
  - name: sub.finder
    command: "echo {domain} > {output_file}"
  - name: upper
    command: "tr a-z A-Z <sub.finder.output_file >{output_file}"
"#;

    let summary: RunSummary = run_workflow(yaml, &targets, &cfg, Arc::new(CountingExecutor::default())).await;
    assert_eq!(summary.failed(), 0);

    let upper: PathBuf = root.path().join("example.com/upper/scan-at-2024-05-01");
    assert_eq!(read(upper), "EXAMPLE.COM\n");
}

//! Suite execution
//!
//! The runner is the host of every test it starts: parallel-eligible tests
//! run concurrently, the rest one after another, and a stop request from a
//! failing test keeps the remaining sequential tests from starting.

use anyhow::Result;
use apiprobe::{Engine, HostRunner, ResultState, Test, TestOutcome};
use apiprobe_core::ConfigLoader;
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::join_all;
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use crate::cli::{RunArgs, ValidateArgs};
use crate::output;
use crate::suite::Suite;

/// Host shared by every test of one run
#[derive(Debug, Default)]
pub struct SuiteHost {
    fail_fast: bool,
    stop: AtomicBool,
}

impl SuiteHost {
    pub fn new(fail_fast: bool) -> Self {
        Self {
            fail_fast,
            stop: AtomicBool::new(false),
        }
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

impl HostRunner for SuiteHost {
    // Scheduling is decided from the test definition before it starts
    fn parallel(&self) {}

    fn broken(&self, message: &str) {
        warn!(reason = message, "test broken");
    }

    fn fail(&self, message: &str) {
        warn!(reason = message, "test failed");
        if self.fail_fast {
            self.stop.store(true, Ordering::SeqCst);
        }
    }

    fn fail_now(&self, message: &str) {
        error!(reason = message, "stop requested");
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// `apiprobe run`
pub async fn run(args: RunArgs, config: Option<&Utf8Path>) -> Result<i32> {
    let engine = load_engine(config)?;
    let tests = load_tests(&engine, &args.suites)?;

    let host = SuiteHost::new(args.fail_fast);
    let outcomes = execute(&tests, &host).await;

    let summary = Summary::new(&outcomes, tests.len());
    summary.print(&outcomes);
    Ok(summary.exit_code())
}

/// `apiprobe validate`
pub fn validate(args: ValidateArgs, config: Option<&Utf8Path>) -> Result<i32> {
    let engine = load_engine(config)?;
    let mut invalid = 0;

    for path in &args.suites {
        match load_suite(&engine, path) {
            Ok(tests) => output::success(&format!("{path}: {} test(s)", tests.len())),
            Err(e) => {
                invalid += 1;
                output::error(&format!("{e:#}"));
            }
        }
    }

    Ok(if invalid == 0 { 0 } else { 1 })
}

fn load_engine(config: Option<&Utf8Path>) -> Result<Engine> {
    let loader = match config {
        Some(path) => ConfigLoader::with_file(path.to_path_buf()),
        None => ConfigLoader::new(),
    };
    Ok(Engine::new(loader.load()?)?)
}

fn load_suite(engine: &Engine, path: &Utf8Path) -> Result<Vec<Test>> {
    let base_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    Suite::load(path)?.build(engine, base_dir)
}

fn load_tests(engine: &Engine, suites: &[Utf8PathBuf]) -> Result<Vec<Test>> {
    let mut tests = Vec::new();
    for path in suites {
        tests.extend(load_suite(engine, path)?);
    }
    Ok(tests)
}

/// Run parallel-eligible tests together, then the rest in order
pub async fn execute(tests: &[Test], host: &SuiteHost) -> Vec<TestOutcome> {
    let (parallel, sequential): (Vec<&Test>, Vec<&Test>) =
        tests.iter().partition(|test| test.is_parallel());

    let mut outcomes = join_all(parallel.iter().map(|test| test.run(host))).await;

    for test in sequential {
        if host.should_stop() {
            warn!(test = test.name(), "not started, run stopped");
            continue;
        }
        outcomes.push(test.run(host).await);
    }
    outcomes
}

/// Counts over the outcomes of one run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub broken: usize,
    pub failed: usize,
    pub not_run: usize,
}

impl Summary {
    pub fn new(outcomes: &[TestOutcome], scheduled: usize) -> Self {
        let mut summary = Self {
            not_run: scheduled.saturating_sub(outcomes.len()),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.external_state() {
                ResultState::Broken => summary.broken += 1,
                state if state.is_failure() => summary.failed += 1,
                _ => summary.passed += 1,
            }
        }
        summary
    }

    /// Non-zero when any test failed; broken tests alone do not fail the run
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            1
        } else {
            0
        }
    }

    pub fn print(&self, outcomes: &[TestOutcome]) {
        output::header("Results");
        for outcome in outcomes {
            print_outcome(outcome);
        }

        println!();
        let mut line = format!(
            "{} passed, {} broken, {} failed",
            self.passed.green(),
            self.broken.yellow(),
            self.failed.red()
        );
        if self.not_run > 0 {
            line.push_str(&format!(", {} not run", self.not_run.dimmed()));
            output::warning("run stopped before every test started");
        }
        println!("{line}");
    }
}

fn print_outcome(outcome: &TestOutcome) {
    let attempts = format!("({} attempt(s))", outcome.attempts());
    match outcome.external_state() {
        ResultState::Broken => println!(
            "{} {} {}",
            "!".yellow().bold(),
            outcome.name(),
            attempts.dimmed()
        ),
        state if state.is_failure() => println!(
            "{} {} {}",
            "✗".red().bold(),
            outcome.name(),
            attempts.dimmed()
        ),
        _ => println!(
            "{} {} {}",
            "✓".green().bold(),
            outcome.name(),
            attempts.dimmed()
        ),
    }

    if outcome.is_success() {
        return;
    }
    for err in outcome.errors() {
        let label = err.name().unwrap_or(err.kind().as_str());
        println!("    {} {}", format!("{label}:").dimmed(), err.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiprobe::{EngineConfig, RetryPolicy};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine() -> Engine {
        let mut config = EngineConfig::default();
        config.request.timeout_ms = 2_000;
        config.request.retry = RetryPolicy::once();
        config.attempt.retry = RetryPolicy::once();
        Engine::new(config).expect("engine")
    }

    async fn server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        server
    }

    fn tests_for(engine: &Engine, yaml: &str) -> Vec<Test> {
        Suite::parse(yaml)
            .unwrap()
            .build(engine, Utf8Path::new("."))
            .unwrap()
    }

    #[test]
    fn test_fail_fast_host_stops_on_failure() {
        let host = SuiteHost::new(true);
        host.broken("flaky");
        assert!(!host.should_stop());
        host.fail("boom");
        assert!(host.should_stop());

        let host = SuiteHost::new(false);
        host.fail("boom");
        assert!(!host.should_stop());
        host.fail_now("required check failed");
        assert!(host.should_stop());
    }

    #[tokio::test]
    async fn test_execute_runs_every_test() {
        let server = server().await;
        let yaml = format!(
            r#"
tests:
  - name: first
    parallel: true
    request: {{ url: "{uri}/ok" }}
    expect: {{ status: 200 }}
  - name: second
    parallel: true
    request: {{ url: "{uri}/ok" }}
    expect: {{ status: 200, body: [ {{ contains: ok }} ] }}
  - name: third
    request: {{ url: "{uri}/missing" }}
    expect: {{ status: 200 }}
"#,
            uri = server.uri()
        );
        let tests = tests_for(&engine(), &yaml);
        let host = SuiteHost::new(false);

        let outcomes = execute(&tests, &host).await;
        let summary = Summary::new(&outcomes, tests.len());
        assert_eq!(
            summary,
            Summary {
                passed: 2,
                broken: 0,
                failed: 1,
                not_run: 0
            }
        );
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_require_failure_stops_sequential_tests() {
        let server = server().await;
        let yaml = format!(
            r#"
tests:
  - name: gate
    request: {{ url: "{uri}/ok" }}
    expect:
      body: [ {{ contains: healthy, severity: require }} ]
  - name: after gate
    request: {{ url: "{uri}/ok" }}
"#,
            uri = server.uri()
        );
        let tests = tests_for(&engine(), &yaml);
        let host = SuiteHost::new(false);

        let outcomes = execute(&tests, &host).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].state(), ResultState::FailFast);

        let summary = Summary::new(&outcomes, tests.len());
        assert_eq!(summary.not_run, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_broken_only_run_exits_zero() {
        let server = server().await;
        let yaml = format!(
            r#"
tests:
  - name: known issue
    request: {{ url: "{uri}/ok" }}
    expect:
      body: [ {{ equal: "fine", severity: broken }} ]
"#,
            uri = server.uri()
        );
        let tests = tests_for(&engine(), &yaml);
        let outcomes = execute(&tests, &SuiteHost::new(true)).await;

        let summary = Summary::new(&outcomes, tests.len());
        assert_eq!(summary.broken, 1);
        assert_eq!(summary.exit_code(), 0);
    }
}

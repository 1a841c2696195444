// ABOUTME: Test support utilities.
// ABOUTME: Scripted command runner and health probe fakes plus config builders.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use deckhand::config::{RunConfig, RunOptions, Settings};
use deckhand::exec::{CommandOutput, CommandRunner, ExecError, Invocation};
use deckhand::health::{HealthEndpoint, HealthProbe, ProbeError};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("deckhand=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// What a scripted command does.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Reply {
    Ok(String),
    Fail { code: i32, stderr: String },
    Missing,
}

#[allow(dead_code)]
impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Reply::Ok(stdout.to_string())
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Reply::Fail {
            code,
            stderr: stderr.to_string(),
        }
    }
}

/// True when `inv` runs `program` and its arguments start with `prefix`.
fn matches(inv: &Invocation, program: &str, prefix: &[&str]) -> bool {
    inv.program == program
        && inv.args.len() >= prefix.len()
        && inv.args.iter().zip(prefix).all(|(a, p)| a == p)
}

struct Rule {
    program: String,
    prefix: Vec<String>,
    reply: Reply,
}

/// Command runner that answers from rules and records every invocation.
/// The most recently added matching rule wins; unmatched commands succeed
/// with empty output.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Invocation>>,
}

#[allow(dead_code)]
impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cluster whose service has an ingress address assigned.
    pub fn cluster_with_ingress(address: &str) -> Self {
        Self::new().on("kubectl", &["get", "service"], Reply::ok(address))
    }

    pub fn on(mut self, program: &str, prefix: &[&str], reply: Reply) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            reply,
        });
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn count(&self, program: &str, prefix: &[&str]) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|inv| matches(inv, program, prefix))
            .count()
    }

    pub fn find(&self, program: &str, prefix: &[&str]) -> Option<Invocation> {
        self.calls
            .lock()
            .iter()
            .find(|inv| matches(inv, program, prefix))
            .cloned()
    }

    /// Position of the first matching call, for ordering assertions.
    pub fn position(&self, program: &str, prefix: &[&str]) -> Option<usize> {
        self.calls
            .lock()
            .iter()
            .position(|inv| matches(inv, program, prefix))
    }

    fn reply_for(&self, inv: &Invocation) -> Reply {
        self.rules
            .iter()
            .rev()
            .find(|rule| {
                let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
                matches(inv, &rule.program, &prefix)
            })
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| Reply::ok(""))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        self.calls.lock().push(invocation.clone());
        match self.reply_for(invocation) {
            Reply::Ok(stdout) => Ok(CommandOutput {
                exit_code: Some(0),
                stdout,
                stderr: String::new(),
            }),
            Reply::Fail { code, stderr } => Ok(CommandOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr,
            }),
            Reply::Missing => Err(ExecError::Spawn {
                command: invocation.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

#[derive(Default)]
#[allow(dead_code)]
struct ProbeLog {
    attempts: Vec<Instant>,
    endpoints: VecDeque<HealthEndpoint>,
}

/// Health probe that fails until attempt `succeed_on` (counted across all
/// polls), or forever when `succeed_on` is `None`. Clones share state.
#[derive(Clone)]
#[allow(dead_code)]
pub struct FakeProbe {
    succeed_on: Option<usize>,
    log: Arc<Mutex<ProbeLog>>,
}

#[allow(dead_code)]
impl FakeProbe {
    pub fn never() -> Self {
        Self {
            succeed_on: None,
            log: Arc::default(),
        }
    }

    pub fn succeeds_on(attempt: usize) -> Self {
        Self {
            succeed_on: Some(attempt),
            log: Arc::default(),
        }
    }

    pub fn always() -> Self {
        Self::succeeds_on(1)
    }

    pub fn attempts(&self) -> usize {
        self.log.lock().attempts.len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.log.lock().attempts.clone()
    }

    pub fn last_endpoint(&self) -> Option<HealthEndpoint> {
        self.log.lock().endpoints.back().cloned()
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn probe(&self, endpoint: &HealthEndpoint) -> Result<(), ProbeError> {
        let mut log = self.log.lock();
        log.attempts.push(Instant::now());
        log.endpoints.push_back(endpoint.clone());
        let attempt = log.attempts.len();

        match self.succeed_on {
            Some(n) if attempt >= n => Ok(()),
            _ => Err(ProbeError::Request {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Resolve a run configuration rooted at `dir` with default settings.
#[allow(dead_code)]
pub fn run_config(dir: &Path, options: RunOptions) -> RunConfig {
    RunConfig::resolve(options, Settings::default(), dir).unwrap()
}

// ABOUTME: Health verification: resolve the target's endpoint, then poll it with bounded retries.
// ABOUTME: Fixed delay between attempts, no backoff; the outcome is terminal for the call.

mod endpoint;
mod probe;

pub use endpoint::{HealthEndpoint, LOCAL_HOST, resolve_endpoint};
pub use probe::{HealthProbe, HttpProbe, ProbeError};

use std::time::Duration;

use crate::config::{HealthPolicy, RunConfig};
use crate::exec::CommandRunner;

/// Result of one verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckOutcome {
    /// A probe succeeded on attempt number `attempts`.
    Healthy {
        endpoint: HealthEndpoint,
        attempts: u32,
    },
    /// No endpoint could be resolved; nothing was probed.
    Unreachable { reason: String },
    /// Every attempt in the budget failed.
    ExhaustedRetries {
        endpoint: HealthEndpoint,
        attempts: u32,
    },
}

/// Attempt counter for one verification call.
#[derive(Debug)]
struct RetryState {
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl RetryState {
    fn new(policy: &HealthPolicy) -> Self {
        Self {
            attempts: 0,
            max_attempts: policy.max_attempts,
            delay: policy.delay,
        }
    }

    /// Number of the attempt about to run, or `None` once the budget is spent.
    fn next_attempt(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    fn has_remaining(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Polls a health endpoint according to a policy.
pub struct HealthVerifier<P> {
    probe: P,
    policy: HealthPolicy,
}

impl<P: HealthProbe> HealthVerifier<P> {
    pub fn new(probe: P, policy: HealthPolicy) -> Self {
        Self { probe, policy }
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Resolve the target's endpoint and poll it.
    pub async fn verify<R: CommandRunner>(
        &self,
        config: &RunConfig,
        runner: &R,
    ) -> HealthCheckOutcome {
        match resolve_endpoint(config, runner).await {
            Ok(endpoint) => self.poll(&endpoint).await,
            Err(reason) => {
                tracing::warn!(%reason, "health endpoint unreachable");
                HealthCheckOutcome::Unreachable { reason }
            }
        }
    }

    /// Probe until the first success or until the attempt budget is spent.
    /// Sleeps `delay` between attempts but not after the last one.
    pub async fn poll(&self, endpoint: &HealthEndpoint) -> HealthCheckOutcome {
        let mut retry = RetryState::new(&self.policy);

        while let Some(attempt) = retry.next_attempt() {
            match tokio::time::timeout(self.policy.timeout, self.probe.probe(endpoint)).await {
                Ok(Ok(())) => {
                    tracing::info!(%endpoint, attempt, "health check passed");
                    return HealthCheckOutcome::Healthy {
                        endpoint: endpoint.clone(),
                        attempts: attempt,
                    };
                }
                Ok(Err(e)) => {
                    tracing::debug!(attempt, max = retry.max_attempts, error = %e, "health probe failed");
                }
                Err(_elapsed) => {
                    tracing::debug!(
                        attempt,
                        max = retry.max_attempts,
                        timeout_secs = self.policy.timeout.as_secs(),
                        "health probe timed out"
                    );
                }
            }

            if retry.has_remaining() {
                tokio::time::sleep(retry.delay).await;
            }
        }

        tracing::warn!(%endpoint, attempts = retry.attempts, "health check retries exhausted");
        HealthCheckOutcome::ExhaustedRetries {
            endpoint: endpoint.clone(),
            attempts: retry.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_state_counts_to_budget() {
        let policy = HealthPolicy {
            max_attempts: 3,
            ..HealthPolicy::default()
        };
        let mut retry = RetryState::new(&policy);
        assert_eq!(retry.next_attempt(), Some(1));
        assert_eq!(retry.next_attempt(), Some(2));
        assert!(retry.has_remaining());
        assert_eq!(retry.next_attempt(), Some(3));
        assert!(!retry.has_remaining());
        assert_eq!(retry.next_attempt(), None);
        assert_eq!(retry.attempts, 3);
    }
}

// ABOUTME: Health endpoint resolution for the active deploy target.
// ABOUTME: Cluster reads the service's load-balancer ingress; local uses the loopback address.

use std::fmt;

use crate::config::{DeployTarget, RunConfig};
use crate::exec::{CommandRunner, Invocation};

/// Where the health probe is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl HealthEndpoint {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self {
            host: host.into(),
            port,
            path,
        }
    }

    /// Value for the `Host` request header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for HealthEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}{}", self.host, self.port, self.path)
    }
}

pub const LOCAL_HOST: &str = "127.0.0.1";

/// jsonpath printing the ingress IP and hostname on separate lines; either may be empty.
const INGRESS_JSONPATH: &str = concat!(
    "jsonpath={.status.loadBalancer.ingress[0].ip}",
    "{\"\\n\"}",
    "{.status.loadBalancer.ingress[0].hostname}",
);

/// Resolve the endpoint for the configured target. `Err` carries the
/// reason no address is available.
pub async fn resolve_endpoint<R: CommandRunner>(
    config: &RunConfig,
    runner: &R,
) -> Result<HealthEndpoint, String> {
    let policy = &config.health;
    match &config.target {
        DeployTarget::Local => Ok(HealthEndpoint::new(LOCAL_HOST, policy.port, &policy.path)),
        DeployTarget::Cluster { namespace } => {
            let service = &config.names.service;
            let inv = Invocation::new("kubectl")
                .args(["get", "service"])
                .arg(service.as_str())
                .arg("--namespace")
                .arg(namespace.as_str())
                .args(["-o", INGRESS_JSONPATH]);

            let out = runner.run_checked(&inv).await.map_err(|e| {
                format!(
                    "could not read service {} in namespace {}: {}",
                    service,
                    namespace,
                    e.platform_message()
                )
            })?;

            match ingress_host(&out.stdout) {
                Some(host) => Ok(HealthEndpoint::new(host, policy.port, &policy.path)),
                None => Err(format!(
                    "service {} in namespace {} has no load-balancer ingress address",
                    service, namespace
                )),
            }
        }
    }
}

/// First non-empty line of the jsonpath output: the IP when assigned, else the hostname.
fn ingress_host(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|line| !line.is_empty())
}

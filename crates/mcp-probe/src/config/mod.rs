//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit CLI value, then environment variable,
//! then built-in default.

use std::time::Duration;

use crate::client::{ClientOptions, IdCorrelation};
use crate::types::{ProbeError, ProbeResult, DEFAULT_PROTOCOL_VERSION};

pub const SERVER_ENV: &str = "MCP_PROBE_SERVER";
pub const BASE_URL_ENV: &str = "MCP_PROBE_BASE_URL";

pub const DEFAULT_SERVER_COMMAND: &str = "npx mcp-ui-probe@latest start";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
/// Command the user runs to serve the pages the script navigates to.
pub const TEST_SERVER_HINT: &str = "npx mcp-ui-probe@latest test-server";

pub const DEFAULT_SETTLE_MS: u64 = 3000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Program and arguments used to launch the MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    /// Split a command line on whitespace. No shell quoting is interpreted.
    pub fn parse(command: &str) -> ProbeResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ProbeError::InvalidCommand("empty command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl std::fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Everything needed to start a probe session.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub server: ServerCommand,
    /// Delay between spawning the server and the first request.
    pub settle: Duration,
    pub client: ClientOptions,
    pub protocol_version: String,
}

impl ProbeConfig {
    pub fn resolve(
        server: Option<&str>,
        settle_ms: u64,
        timeout_secs: u64,
        strict_ids: bool,
    ) -> ProbeResult<Self> {
        Ok(Self {
            server: ServerCommand::parse(&resolve_server_command(server))?,
            settle: Duration::from_millis(settle_ms),
            client: ClientOptions {
                timeout: timeout_from_secs(timeout_secs),
                correlation: if strict_ids {
                    IdCorrelation::Strict
                } else {
                    IdCorrelation::Lenient
                },
            },
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        })
    }
}

/// Resolve the server launch command.
pub fn resolve_server_command(explicit: Option<&str>) -> String {
    resolve_setting(explicit, SERVER_ENV, DEFAULT_SERVER_COMMAND)
}

/// Resolve the base URL of the pages under test. Trailing slashes are dropped.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    resolve_setting(explicit, BASE_URL_ENV, DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_string()
}

/// `0` disables the timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn resolve_setting(explicit: Option<&str>, env_key: &str, default: &str) -> String {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }

    if let Ok(env_value) = std::env::var(env_key) {
        if !env_value.trim().is_empty() {
            return env_value;
        }
    }

    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_command() {
        let cmd = ServerCommand::parse("npx  mcp-ui-probe@latest start").unwrap();
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.args, vec!["mcp-ui-probe@latest", "start"]);
        assert_eq!(cmd.to_string(), "npx mcp-ui-probe@latest start");
    }

    #[test]
    fn test_parse_empty_command_rejected() {
        assert!(matches!(
            ServerCommand::parse("   "),
            Err(ProbeError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_explicit_wins() {
        assert_eq!(resolve_setting(Some("cat"), "MCP_PROBE_TEST_UNSET_A", "x"), "cat");
    }

    #[test]
    fn test_env_then_default() {
        std::env::set_var("MCP_PROBE_TEST_SET_B", "from-env");
        assert_eq!(resolve_setting(None, "MCP_PROBE_TEST_SET_B", "x"), "from-env");
        assert_eq!(resolve_setting(Some(""), "MCP_PROBE_TEST_SET_B", "x"), "from-env");
        std::env::remove_var("MCP_PROBE_TEST_SET_B");
        assert_eq!(resolve_setting(None, "MCP_PROBE_TEST_SET_B", "x"), "x");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(
            resolve_base_url(Some("http://127.0.0.1:9000/")),
            "http://127.0.0.1:9000"
        );
    }

    #[test]
    fn test_timeout_zero_disables() {
        assert_eq!(timeout_from_secs(0), None);
        assert_eq!(timeout_from_secs(5), Some(Duration::from_secs(5)));
    }
}

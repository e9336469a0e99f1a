//! A probe session: one server process plus the client talking to it.

use std::process::ExitStatus;

use tokio::io::BufReader;
use tokio::process::{ChildStdin, ChildStdout};

use crate::client::McpClient;
use crate::config::ProbeConfig;
use crate::process::{ServerProcess, TERMINATE_GRACE};
use crate::types::ProbeResult;

pub type ProcessClient = McpClient<BufReader<ChildStdout>, ChildStdin>;

pub struct ProbeSession {
    process: ServerProcess,
    client: ProcessClient,
}

impl ProbeSession {
    /// Spawn the server, wait the settle delay, and connect a client.
    ///
    /// The delay is only a head start for slow launchers such as `npx`;
    /// readiness is established by the `initialize` exchange.
    pub async fn start(config: &ProbeConfig) -> ProbeResult<Self> {
        let (process, stdout, stdin) = ServerProcess::spawn(&config.server)?;

        if !config.settle.is_zero() {
            tracing::debug!("Waiting {}ms for server to settle", config.settle.as_millis());
            tokio::time::sleep(config.settle).await;
        }

        let client = McpClient::new(stdout, stdin, config.client.clone());
        Ok(Self { process, client })
    }

    pub fn client(&mut self) -> &mut ProcessClient {
        &mut self.client
    }

    /// Close the server's stdin and terminate it.
    pub async fn cleanup(mut self) -> Option<ExitStatus> {
        if let Err(e) = self.client.shutdown().await {
            tracing::debug!("Closing server stdin failed: {e}");
        }
        self.process.terminate(TERMINATE_GRACE).await
    }
}

//! JSON-RPC client over a line transport.
//!
//! Requests are strictly sequential: every `send_request` writes one line and
//! then reads one line before returning.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::diagnostics::{preview, PARAMS_PREVIEW_CHARS, RESPONSE_PREVIEW_CHARS};
use crate::transport::{framing, LineRead, StdioTransport};
use crate::types::*;

/// How a response id that differs from the request id is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdCorrelation {
    /// Log a warning and return the response anyway (in-order delivery assumed).
    #[default]
    Lenient,
    /// Fail with `ProbeError::IdMismatch`.
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Upper bound on each response read. `None` waits forever.
    pub timeout: Option<Duration>,
    pub correlation: IdCorrelation,
}

pub struct McpClient<R, W> {
    transport: StdioTransport<R, W>,
    next_id: i64,
    options: ClientOptions,
    closed: bool,
}

impl<R, W> McpClient<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, options: ClientOptions) -> Self {
        Self {
            transport: StdioTransport::new(reader, writer),
            next_id: 1,
            options,
            closed: false,
        }
    }

    /// Id that the next request will carry.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// True once the server's output stream has ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Send one request and read one response line.
    ///
    /// Returns the parsed response document, or `{}` when the stream has
    /// ended. Error envelopes are returned as data, not as `Err`.
    pub async fn send_request(&mut self, method: &str, params: Option<Value>) -> ProbeResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        tracing::info!(id, "Sending: {method}");
        tracing::info!("Params: {}", preview(&request.params, PARAMS_PREVIEW_CHARS));

        if self.closed {
            tracing::warn!("Server stream already closed, skipping `{method}`");
            return Ok(empty_object());
        }

        let framed = framing::frame_message(&request)?;
        if !self.write_or_close(&framed, method).await? {
            return Ok(empty_object());
        }

        let line = match self.transport.read_line(self.options.timeout).await? {
            LineRead::Line(line) => line,
            LineRead::Eof => {
                tracing::warn!("Server output ended before responding to `{method}`");
                self.closed = true;
                return Ok(empty_object());
            }
            LineRead::TimedOut => {
                return Err(ProbeError::Timeout {
                    method: method.to_string(),
                    after: self.options.timeout.unwrap_or_default(),
                });
            }
        };

        let response = framing::parse_line(&line)?;
        tracing::info!("Response: {}", preview(&response, RESPONSE_PREVIEW_CHARS));
        tracing::debug!("Raw response: {}", line.trim_end());

        self.check_correlation(id, &response)?;
        Ok(response)
    }

    /// Send a notification. Nothing is read back.
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> ProbeResult<()> {
        if self.closed {
            tracing::warn!("Server stream already closed, dropping notification `{method}`");
            return Ok(());
        }

        let notification = JsonRpcNotification::new(method, params);
        let framed = framing::frame_message(&notification)?;
        tracing::debug!("Notifying: {method}");
        self.write_or_close(&framed, method).await.map(|_| ())
    }

    /// Issue `tools/call` with params `{name, arguments}`.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> ProbeResult<Value> {
        let params = serde_json::to_value(ToolCallParams::new(name, arguments))?;
        self.send_request("tools/call", Some(params)).await
    }

    /// Issue `tools/list` and decode the tool definitions.
    ///
    /// An empty reply (stream closed) yields no tools; an error envelope is
    /// raised as `ProbeError::Rpc`.
    pub async fn list_tools(&mut self) -> ProbeResult<Vec<ToolDefinition>> {
        let response = self.send_request("tools/list", Some(empty_object())).await?;
        if let Some(err) = ProbeError::from_response(&response) {
            return Err(err);
        }
        Ok(decode_tool_list(&response))
    }

    /// `initialize` handshake followed by the `notifications/initialized` notification.
    pub async fn initialize(&mut self, protocol_version: &str) -> ProbeResult<Value> {
        let params = serde_json::to_value(InitializeParams::new(protocol_version))?;
        let response = self.send_request("initialize", Some(params)).await?;
        if JsonRpcReply::from_value(&response).result.is_some() {
            self.notify("notifications/initialized", None).await?;
        }
        Ok(response)
    }

    /// Close the server's input stream.
    pub async fn shutdown(&mut self) -> ProbeResult<()> {
        self.transport.close().await
    }

    /// Write one frame. A broken pipe marks the stream closed and yields
    /// `Ok(false)` instead of an error.
    async fn write_or_close(&mut self, framed: &str, method: &str) -> ProbeResult<bool> {
        match self.transport.write_frame(framed).await {
            Ok(()) => Ok(true),
            Err(ProbeError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::warn!("Server input closed while sending `{method}`");
                self.closed = true;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn check_correlation(&self, expected: i64, response: &Value) -> ProbeResult<()> {
        let got = match JsonRpcReply::from_value(response).id {
            // Missing or null ids are what servers send for unparseable requests.
            None | Some(RequestId::Null) => return Ok(()),
            Some(id) => id,
        };

        if got == RequestId::Number(expected) {
            return Ok(());
        }

        match self.options.correlation {
            IdCorrelation::Strict => Err(ProbeError::IdMismatch { expected, got }),
            IdCorrelation::Lenient => {
                tracing::warn!("Response id {got} does not match request id {expected}");
                Ok(())
            }
        }
    }
}

/// Tools listed in a `tools/list` response; empty when there is no result.
///
/// Entries are decoded one by one so a single malformed tool is skipped
/// with a warning rather than hiding the rest.
pub fn decode_tool_list(response: &Value) -> Vec<ToolDefinition> {
    let Some(entries) = JsonRpcReply::from_value(response)
        .result
        .and_then(|result| result.get("tools").cloned())
    else {
        return Vec::new();
    };

    let Value::Array(entries) = entries else {
        tracing::warn!("`tools` in tools/list result is not an array");
        return Vec::new();
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            serde_json::from_value::<ToolDefinition>(entry)
                .map_err(|e| tracing::warn!("Skipping malformed tool #{index}: {e}"))
                .ok()
        })
        .collect()
}

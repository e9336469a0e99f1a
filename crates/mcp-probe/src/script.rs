//! The fixed probe conversation: seven calls against a UI-probe MCP server.

use std::io::Write;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::client::{decode_tool_list, McpClient};
use crate::diagnostics::{truncate_chars, DESCRIPTION_PREVIEW_CHARS};
use crate::types::*;

/// Tools shown from the `tools/list` response.
pub const TOOL_PREVIEW_LIMIT: usize = 5;

const BANNER: &str = "UI-PROBE MCP PROTOCOL TEST SUITE";
const RULE_WIDTH: usize = 50;

/// One call the script makes.
#[derive(Debug, Clone, PartialEq)]
pub enum StepCall {
    Initialize { protocol_version: String },
    ListTools,
    Tool { name: String, arguments: Value },
}

impl StepCall {
    pub fn method(&self) -> &'static str {
        match self {
            StepCall::Initialize { .. } => "initialize",
            StepCall::ListTools => "tools/list",
            StepCall::Tool { .. } => "tools/call",
        }
    }

    /// Params as they go on the wire.
    pub fn params(&self) -> Value {
        match self {
            StepCall::Initialize { protocol_version } => {
                serde_json::to_value(InitializeParams::new(protocol_version.as_str()))
                    .unwrap_or_default()
            }
            StepCall::ListTools => empty_object(),
            StepCall::Tool { name, arguments } => {
                json!({ "name": name, "arguments": arguments })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub title: &'static str,
    pub call: StepCall,
}

fn tool_step(title: &'static str, name: &str, arguments: Value) -> ScriptStep {
    ScriptStep {
        title,
        call: StepCall::Tool {
            name: name.to_string(),
            arguments,
        },
    }
}

/// The seven steps, in order. `base_url` is the page server root.
pub fn script_steps(base_url: &str, protocol_version: &str) -> Vec<ScriptStep> {
    vec![
        ScriptStep {
            title: "INITIALIZE CONNECTION",
            call: StepCall::Initialize {
                protocol_version: protocol_version.to_string(),
            },
        },
        ScriptStep {
            title: "LIST AVAILABLE TOOLS",
            call: StepCall::ListTools,
        },
        tool_step(
            "NAVIGATE TO TEST PAGE",
            "navigate",
            json!({ "url": format!("{base_url}/test") }),
        ),
        tool_step("ANALYZE PAGE UI", "analyze_ui", json!({})),
        tool_step(
            "VERIFY PAGE CONTENT",
            "verify_page",
            json!({
                "expectedContent": ["Test", "Form"],
                "unexpectedContent": ["404", "Error"]
            }),
        ),
        tool_step("CLICK BUTTON TEST", "click_button", json!({ "text": "Submit" })),
        tool_step(
            "RUN NATURAL LANGUAGE FLOW",
            "run_flow",
            json!({
                "goal": "Fill out the test form with sample data",
                "url": format!("{base_url}/test/forms")
            }),
        ),
    ]
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok,
    RpcError { code: i32, message: String },
    /// Stream closed before a response arrived.
    Empty,
}

impl StepOutcome {
    fn classify(response: &Value) -> Self {
        let reply = JsonRpcReply::from_value(response);
        if let Some(err) = reply.error {
            return StepOutcome::RpcError {
                code: err.code,
                message: err.message,
            };
        }
        if reply.is_empty() {
            return StepOutcome::Empty;
        }
        StepOutcome::Ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub title: &'static str,
    pub method: &'static str,
    pub outcome: StepOutcome,
    pub response: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptReport {
    pub steps: Vec<StepReport>,
    pub tools: Vec<ToolDefinition>,
}

impl ScriptReport {
    pub fn all_ok(&self) -> bool {
        self.steps.iter().all(|s| s.outcome == StepOutcome::Ok)
    }

    pub fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Run every step against `client`, writing the transcript to `out`.
///
/// Error envelopes and closed streams are recorded and the run moves on;
/// transport and parse failures abort it.
pub async fn run_tests<R, W, O>(
    client: &mut McpClient<R, W>,
    steps: &[ScriptStep],
    out: &mut O,
) -> ProbeResult<ScriptReport>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    O: Write,
{
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "\n{rule}\n{BANNER}\n{rule}")?;

    let mut report = ScriptReport::default();
    let total = steps.len();

    for (index, step) in steps.iter().enumerate() {
        writeln!(out, "\n[{}/{total}] {}", index + 1, step.title)?;
        writeln!(out, "   -> {}", step.call.method())?;

        // One request line per step; the script sends no notifications.
        let response = match &step.call {
            StepCall::Tool { name, arguments } => client.call_tool(name, arguments.clone()).await?,
            call => client.send_request(call.method(), Some(call.params())).await?,
        };

        if step.call == StepCall::ListTools && response.get("result").is_some() {
            let tools = decode_tool_list(&response);
            print_tools(out, &tools)?;
            report.tools = tools;
        }

        let outcome = StepOutcome::classify(&response);
        print_outcome(out, &outcome)?;

        report.steps.push(StepReport {
            title: step.title,
            method: step.call.method(),
            outcome,
            response,
        });
    }

    let ok = report.count(|o| *o == StepOutcome::Ok);
    if report.all_ok() {
        writeln!(out, "\nAll tests completed! ({ok}/{total} ok)")?;
    } else {
        let failed = report.count(|o| matches!(o, StepOutcome::RpcError { .. }));
        let empty = report.count(|o| *o == StepOutcome::Empty);
        writeln!(
            out,
            "\nAll tests completed: {ok} ok, {failed} error, {empty} without response"
        )?;
    }

    Ok(report)
}

/// The `Found N tools:` block, capped at `TOOL_PREVIEW_LIMIT` entries.
pub fn print_tools<O: Write>(out: &mut O, tools: &[ToolDefinition]) -> std::io::Result<()> {
    writeln!(out, "   Found {} tools:", tools.len())?;
    for tool in tools.iter().take(TOOL_PREVIEW_LIMIT) {
        let description = tool.description.as_deref().unwrap_or("");
        writeln!(
            out,
            "   - {}: {}...",
            tool.name,
            truncate_chars(description, DESCRIPTION_PREVIEW_CHARS)
        )?;
    }
    Ok(())
}

fn print_outcome<O: Write>(out: &mut O, outcome: &StepOutcome) -> std::io::Result<()> {
    match outcome {
        StepOutcome::Ok => writeln!(out, "   <- ok"),
        StepOutcome::RpcError { code, message } => match error_codes::name(*code) {
            Some(name) => writeln!(out, "   <- error {code} ({name}): {message}"),
            None => writeln!(out, "   <- error {code}: {message}"),
        },
        StepOutcome::Empty => writeln!(out, "   <- no response (server stream closed)"),
    }
}

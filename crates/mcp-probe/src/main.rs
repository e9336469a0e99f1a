//! mcp-probe — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rustyline::error::ReadlineError;
use serde_json::Value;

use mcp_probe::config::{
    resolve_base_url, ProbeConfig, DEFAULT_SETTLE_MS, DEFAULT_TIMEOUT_SECS, TEST_SERVER_HINT,
};
use mcp_probe::script::{print_tools, run_tests, script_steps, ScriptReport};
use mcp_probe::session::ProbeSession;
use mcp_probe::types::{empty_object, ProbeError, CLIENT_NAME, CLIENT_VERSION};

#[derive(Parser)]
#[command(
    name = "mcp-probe",
    about = "Protocol test client for MCP servers speaking JSON-RPC 2.0 over stdio",
    version
)]
struct Cli {
    /// Command that launches the MCP server.
    /// Also reads from MCP_PROBE_SERVER env var.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Delay after launching the server before the first request, in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_SETTLE_MS)]
    settle_ms: u64,

    /// Seconds to wait for each response (0 waits forever).
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Fail when a response id does not match its request id.
    #[arg(long, global = true)]
    strict_ids: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fixed protocol test sequence (default).
    Run {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Root URL of the test page server.
        /// Also reads from MCP_PROBE_BASE_URL env var.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Send a single request after initializing and print the response.
    Call {
        /// JSON-RPC method name.
        method: String,

        /// Params as a JSON object (default `{}`).
        params: Option<String>,
    },

    /// Call a single tool after initializing and print the response.
    Tool {
        /// Tool name.
        name: String,

        /// Arguments as a JSON object (default `{}`).
        arguments: Option<String>,
    },

    /// List the tools the server exposes.
    Tools,

    /// Print client identity and the test sequence as JSON.
    Info {
        /// Root URL of the test page server.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   mcp-probe completions bash > ~/.local/share/bash-completion/completions/mcp-probe
    ///   mcp-probe completions zsh > ~/.zfunc/_mcp-probe
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ProbeConfig::resolve(
        cli.server.as_deref(),
        cli.settle_ms,
        cli.timeout_secs,
        cli.strict_ids,
    )?;

    match cli.command.unwrap_or(Commands::Run {
        yes: false,
        base_url: None,
    }) {
        Commands::Run { yes, base_url } => {
            let base_url = resolve_base_url(base_url.as_deref());

            println!("Make sure the test page server is running:");
            println!("   {TEST_SERVER_HINT}");
            println!("Pages are expected under {base_url}");

            if !yes && !tokio::task::spawn_blocking(confirm).await?? {
                println!("Aborted.");
                return Ok(());
            }

            let steps = script_steps(&base_url, &config.protocol_version);
            let mut session = ProbeSession::start(&config).await?;
            let result = run_tests(session.client(), &steps, &mut std::io::stdout()).await;

            println!("\nStopping server...");
            session.cleanup().await;

            let report: ScriptReport = result?;
            if !report.all_ok() {
                std::process::exit(1);
            }
        }

        Commands::Call { method, params } => {
            let params = parse_json_arg(params.as_deref())?;
            let mut session = start_initialized(&config).await?;
            let result = session.client().send_request(&method, Some(params)).await;
            session.cleanup().await;
            print_response(&result?)?;
        }

        Commands::Tool { name, arguments } => {
            let arguments = parse_json_arg(arguments.as_deref())?;
            let mut session = start_initialized(&config).await?;
            let result = session.client().call_tool(&name, arguments).await;
            session.cleanup().await;
            print_response(&result?)?;
        }

        Commands::Tools => {
            let mut session = start_initialized(&config).await?;
            let result = session.client().list_tools().await;
            session.cleanup().await;
            print_tools(&mut std::io::stdout(), &result?)?;
        }

        Commands::Info { base_url } => {
            let base_url = resolve_base_url(base_url.as_deref());
            let steps = script_steps(&base_url, &config.protocol_version);
            let info = serde_json::json!({
                "client": { "name": CLIENT_NAME, "version": CLIENT_VERSION },
                "protocol_version": config.protocol_version,
                "server_command": config.server.to_string(),
                "steps": steps.iter().map(|s| serde_json::json!({
                    "title": s.title,
                    "method": s.call.method(),
                    "params": s.call.params(),
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mcp-probe", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Start a session and complete the `initialize` handshake.
/// The server is cleaned up if the handshake fails.
async fn start_initialized(config: &ProbeConfig) -> anyhow::Result<ProbeSession> {
    let mut session = ProbeSession::start(config).await?;

    let init = session
        .client()
        .initialize(&config.protocol_version)
        .await
        .and_then(|response| match ProbeError::from_response(&response) {
            Some(err) => Err(err),
            None => Ok(()),
        });

    match init {
        Ok(()) => Ok(session),
        Err(e) => {
            session.cleanup().await;
            Err(e.into())
        }
    }
}

fn confirm() -> anyhow::Result<bool> {
    let mut editor = rustyline::DefaultEditor::new()?;
    match editor.readline("Press Enter to continue...") {
        Ok(_) => Ok(true),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn parse_json_arg(arg: Option<&str>) -> anyhow::Result<Value> {
    let value = match arg {
        Some(text) => serde_json::from_str(text)
            .map_err(|e| ProbeError::InvalidParams(format!("{text}: {e}")))?,
        None => empty_object(),
    };
    if !value.is_object() {
        return Err(ProbeError::InvalidParams("expected a JSON object".to_string()).into());
    }
    Ok(value)
}

fn print_response(response: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if ProbeError::from_response(response).is_some() {
        std::process::exit(1);
    }
    Ok(())
}

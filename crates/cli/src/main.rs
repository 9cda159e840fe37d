//! Augent CLI — the main entry point.
//!
//! Commands:
//! - `ask`    — Send a query to the agent (one-shot, optionally streamed)
//! - `tools`  — List the registered tools

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use augent_agent::{AgentService, ToolOrchestrator, ToolRegistry};
use augent_config::AppConfig;
use augent_core::agent::AgentRequest;
use augent_core::tool::{StreamingTool, Tool};
use augent_limiter::{RateLimiterSettings, TokenBucketRateLimiter};
use augent_providers::{ClaudeService, RateLimitedLlm};
use augent_tools::{CalculatorTool, ChatTool, SearchTool, StreamingChatTool, WeatherTool};

#[derive(Parser)]
#[command(name = "augent", about = "Augent — tool-augmented LLM dialogue agent", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults + env overrides when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a query to the agent
    Ask {
        /// The query text
        query: Vec<String>,

        /// Stream the response incrementally
        #[arg(short, long)]
        stream: bool,

        /// Restrict dispatch to these tools
        #[arg(short, long)]
        tool: Vec<String>,
    },

    /// List the registered tools
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path).context("Failed to load config")?,
        None => AppConfig::from_env().context("Failed to build config from environment")?,
    };

    let service = build_service(&config);

    match cli.command {
        Commands::Ask { query, stream, tool } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("No query given");
            }

            let mut request = AgentRequest::new(query);
            if !tool.is_empty() {
                request.use_all_tools = false;
                request.specific_tools = tool;
            }

            if stream {
                run_streaming(&service, request).await?;
            } else {
                let response = service.process(request).await;
                if response.success {
                    println!("{}", response.response);
                    tracing::debug!(tool = %response.tool_used, "Query handled");
                } else {
                    anyhow::bail!(
                        "{}",
                        response
                            .error_message
                            .unwrap_or_else(|| "Request failed".into())
                    );
                }
            }
        }
        Commands::Tools => {
            for descriptor in service.available_tools() {
                println!("{:<16} {}", descriptor.name, descriptor.description);
            }
        }
    }

    Ok(())
}

async fn run_streaming(service: &AgentService, request: AgentRequest) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl+C cancels the stream; the relay emits one final chunk and closes.
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let mut rx = service.process_streaming(request, cancel).await;
    let mut stdout = std::io::stdout();

    while let Some(chunk) = rx.recv().await {
        if let Some(error) = &chunk.error {
            eprintln!();
            anyhow::bail!("{error}");
        }
        if !chunk.content.is_empty() {
            print!("{}", chunk.content);
            stdout.flush()?;
        }
        if chunk.is_complete {
            break;
        }
    }

    println!();
    Ok(())
}

/// Wire the full stack: limiter-gated Claude backend, deterministic tools,
/// and the conversational tools in front of them.
fn build_service(config: &AppConfig) -> AgentService {
    let limiter = Arc::new(TokenBucketRateLimiter::new(RateLimiterSettings {
        requests_per_minute: config.limiter.requests_per_minute,
        tokens_per_minute: config.limiter.tokens_per_minute,
        buffer_percentage: config.limiter.buffer_percentage,
        bucket_expiration: std::time::Duration::from_secs(
            config.limiter.bucket_expiration_minutes * 60,
        ),
    }));

    let llm = Arc::new(RateLimitedLlm::new(
        ClaudeService::new(config.claude.clone()),
        limiter,
    ));

    let deterministic: Vec<Arc<dyn Tool>> = vec![
        Arc::new(CalculatorTool),
        Arc::new(WeatherTool),
        Arc::new(SearchTool),
    ];

    // The orchestrator behind the chat tool covers the full registry; its
    // denylist keeps the conversational tools out of tagged dispatch.
    let streaming_chat = Arc::new(StreamingChatTool::new(llm.clone(), config.chat.clone()));

    let mut tools = deterministic.clone();
    let inner_registry = Arc::new(ToolRegistry::new(deterministic));
    let orchestrator = Arc::new(ToolOrchestrator::new(inner_registry));
    tools.push(Arc::new(ChatTool::new(llm, orchestrator)));
    tools.push(streaming_chat.clone());

    let registry = Arc::new(ToolRegistry::new(tools));
    AgentService::new(registry)
        .with_selection(config.selection.clone())
        .with_streaming_tool(streaming_chat as Arc<dyn StreamingTool>)
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use property_agent::{AgentConfig, Orchestrator};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "property-agent")]
#[command(about = "Natural-language agent over property, chart, card and mutation services")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Server {
        #[arg(short, long, env = "PORT", default_value = "9000")]
        port: u16,
        /// Bind address, without the port
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
    /// Run one query and print the aggregated response
    Run { query: String },
    /// Show the invocations a query resolves to, without executing them
    Parse { query: String },
    /// List the registered tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("property_agent=info".parse()?)
                .add_directive("hyper=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::load()?;
    let orchestrator = Orchestrator::new(&config)?;

    match cli.command {
        Commands::Server { port, bind } => {
            let addr = format!("{}:{}", bind, port);
            let app = property_agent::api::create_router(Arc::new(orchestrator));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Server listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Run { query } => {
            info!("Running query '{}'", query);
            let response = orchestrator.run(&query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Parse { query } => {
            let invocations = orchestrator.plan(&query).await?;
            println!("Query: {}", query);
            println!("Recognizer: {}", orchestrator.parser().recognizer_name());
            println!("Found {} invocations:", invocations.len());
            for invocation in invocations {
                println!("  Tool: {}", invocation.tool);
                println!("    Args: {}", serde_json::Value::Object(invocation.args));
                if !invocation.missing.is_empty() {
                    println!("    Missing: {}", invocation.missing.join(", "));
                }
                println!();
            }
        }
        Commands::Tools => {
            let registry = orchestrator.registry();
            println!("{} tools:", registry.len());
            for spec in registry.list() {
                println!("  {} [{}]", spec.signature(), spec.category);
                println!("    {}", spec.description);
            }
        }
    }

    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use weft_core::{AgentDescriptor, AgentSkill};
use weft_server::Adapter;

use weft::search_agent::build_search_graph;
use weft::settings::WeftSettings;
use weft::sql_agent::build_sql_graph;

#[derive(Parser)]
#[command(name = "weft", version, about = "Serve workflow agents over the A2A protocol")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "weft.toml", env = "WEFT_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the echo demo agent (plain function strategy)
    Echo {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Serve the web search demo agent (graph strategy)
    Search {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Serve the SQL assistant demo agent (graph strategy)
    Sql {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the agent card for the current configuration
    Card,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info,warn")),
        )
        .with_target(false)
        .init();
}

fn echo_descriptor(settings: &WeftSettings) -> AgentDescriptor {
    let mut descriptor = settings.agent.clone();
    if descriptor.skills.is_empty() {
        descriptor = descriptor.with_skills(vec![AgentSkill::new("echo", "Echo")
            .with_description("Echoes the input back")
            .with_examples(vec!["say hello".to_string()])]);
    }
    descriptor
}

fn sql_descriptor(settings: &WeftSettings) -> AgentDescriptor {
    let mut descriptor = settings.agent.clone();
    if descriptor.skills.is_empty() {
        descriptor = descriptor.with_skills(vec![AgentSkill::new("text-to-sql", "Text to SQL")
            .with_description("Translates natural-language questions into SQL statements")
            .with_examples(vec![
                "how many orders shipped last week".to_string()
            ])]);
    }
    descriptor
}

fn search_descriptor(settings: &WeftSettings) -> AgentDescriptor {
    let mut descriptor = settings.agent.clone();
    if descriptor.skills.is_empty() {
        descriptor = descriptor.with_skills(vec![AgentSkill::new("web-search", "Web search")
            .with_description("Searches the web and summarizes what it finds")
            .with_examples(vec![
                "latest developments in async Rust".to_string()
            ])]);
    }
    descriptor
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Echo { host, port } => {
            let settings = WeftSettings::load_or_default(&cli.config, "Echo Agent")?;
            let adapter = Adapter::from_fn(
                |query| Ok(json!({"response": format!("echo: {query}")})),
                echo_descriptor(&settings),
            );
            adapter.serve(host, port).await?;
        }
        Commands::Search { host, port } => {
            let settings = WeftSettings::load_or_default(&cli.config, "Search Agent")?;
            let graph = build_search_graph(&settings.model)?;
            let adapter = Adapter::from_graph_with_keys(
                graph,
                search_descriptor(&settings),
                "query",
                "messages",
            );
            adapter.serve(host, port).await?;
        }
        Commands::Sql { host, port } => {
            let settings = WeftSettings::load_or_default(&cli.config, "SQL Assistant")?;
            let graph = build_sql_graph(&settings.model)?;
            let adapter = Adapter::from_graph_with_keys(
                graph,
                sql_descriptor(&settings),
                "question",
                "messages",
            );
            adapter.serve(host, port).await?;
        }
        Commands::Card => {
            let settings = WeftSettings::load_or_default(&cli.config, "Weft Agent")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&settings.agent.agent_card())?
            );
        }
    }

    Ok(())
}

use axum::http::HeaderMap;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use docfinder_a2a::{A2aError, A2aServer, ConfigError, Message, ServerConfigBuilder};
use docfinder_search::{
    DoctorSearchExecutor, ExtractError, FixtureDoctorSearch, SearchConfigBuilder, SearchError,
    extract,
};

#[derive(Parser, Debug)]
#[command(name = "docfinder", version)]
#[command(about = "Doctor search agent served over the A2A protocol")]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

/// Options shared by commands that build the agent. Each flag also reads its
/// `DOCFINDER_*` variable.
#[derive(clap::Args, Debug, Default)]
struct AgentArgs {
    /// Minimum fields a query must carry
    /// (zipcode-or-lastname, zipcode-lastname-or-specialty)
    #[arg(long, env = "DOCFINDER_REQUIRED_FIELDS")]
    required_fields: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address, e.g. 0.0.0.0:8080
        #[arg(long, env = "DOCFINDER_BIND_ADDR")]
        bind: Option<String>,
        /// Remote search endpoint
        #[arg(long, env = "DOCFINDER_SEARCH_URL")]
        search_url: Option<String>,
        /// JSON file of doctors for the in-memory backend
        #[arg(long, env = "DOCFINDER_FIXTURES_PATH")]
        fixtures: Option<PathBuf>,
        /// Externally visible base URL for the agent card
        #[arg(long, env = "DOCFINDER_PUBLIC_BASE_URL")]
        public_base_url: Option<String>,
        /// Reject canceling tasks that already finished
        #[arg(long)]
        strict_cancel: bool,
        /// Include internal error detail in responses
        #[arg(long)]
        debug: bool,
        #[command(flatten)]
        agent: AgentArgs,
    },
    /// Print the search query extracted from a piece of text
    Extract {
        text: String,
        #[command(flatten)]
        agent: AgentArgs,
    },
    /// Print the agent card
    Card {
        /// Base URL to advertise
        #[arg(long, env = "DOCFINDER_PUBLIC_BASE_URL")]
        base_url: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Server(#[from] A2aError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

fn init_logging(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

fn search_builder(agent: AgentArgs) -> Result<SearchConfigBuilder, ConfigError> {
    let mut builder = SearchConfigBuilder::from_env()?;
    if let Some(policy) = agent.required_fields {
        builder = builder.required_fields(policy);
    }
    Ok(builder)
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Serve {
            bind,
            search_url,
            fixtures,
            public_base_url,
            strict_cancel,
            debug,
            agent,
        } => {
            let mut server_config = ServerConfigBuilder::from_env()?;
            if let Some(bind) = bind {
                server_config = server_config.bind_addr(bind);
            }
            if let Some(url) = public_base_url {
                server_config = server_config.public_base_url(url);
            }
            if strict_cancel {
                server_config = server_config.strict_cancel(true);
            }
            if debug {
                server_config = server_config.debug(true);
            }
            let server_config = server_config.build()?;

            let mut search_config = search_builder(agent)?;
            if let Some(url) = search_url {
                search_config = search_config.search_url(url);
            }
            if let Some(path) = fixtures {
                search_config = search_config.fixtures_path(path);
            }
            let search_config = search_config.build()?;

            let executor = DoctorSearchExecutor::new(search_config.backend().await?)
                .with_policy(search_config.required_fields);
            let server = A2aServer::with_config(executor, server_config);
            let cleanup = server.start_cleanup_task();
            let result = server.serve().await;
            cleanup.abort();
            result?;
        }
        Commands::Extract { text, agent } => {
            let policy = search_builder(agent)?.build()?.required_fields;
            let query = extract(&Message::user(text), &HashMap::new(), policy)?;
            println!("{}", serde_json::to_string_pretty(&query)?);
        }
        Commands::Card { base_url } => {
            let mut config = ServerConfigBuilder::from_env()?;
            if let Some(url) = base_url {
                config = config.public_base_url(url);
            }
            let executor = DoctorSearchExecutor::new(Arc::new(FixtureDoctorSearch::default()));
            let server = A2aServer::with_config(executor, config.build()?);
            let card = server.agent_card(&HeaderMap::new());
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Err(e) = run(cli.command).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sintropia::auth::StaticTokenVerifier;
use sintropia::config::ServerConfig;
use sintropia::server::{AppState, create_router};
use sintropia::store::{SqliteStore, Store};
use sintropia::types::constants::all_constants;

#[derive(Parser)]
#[command(name = "sintropia")]
#[command(about = "Inventory and planning server for syntropic gardens", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "SINTROPIA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        #[command(flatten)]
        overrides: Overrides,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Create the database schema and exit
    Migrate {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the enumerated value sets as JSON
    Constants,
}

#[derive(Args)]
struct Overrides {
    /// Data directory for the database
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Err(e) if !e.not_found() => return Err(e.into()),
        _ => {}
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sintropia=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Constants => {
            println!("{}", serde_json::to_string_pretty(&all_constants())?);
        }
        Commands::Migrate { overrides } => {
            overrides.apply(&mut config);
            open_store(&config)?;
            info!("Schema ready at {}", config.db_path().display());
        }
        Commands::Serve {
            overrides,
            host,
            port,
        } => {
            overrides.apply(&mut config);
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let store = open_store(&config)?;
            info!("Database ready at {}", config.db_path().display());

            let verifier = StaticTokenVerifier::from_entries(&config.tokens);
            let state = Arc::new(AppState::new(
                Arc::new(store),
                Arc::new(verifier),
                config.pagination,
            ));

            let app = create_router(state.clone());
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            state.store.close()?;
        }
    }

    Ok(())
}

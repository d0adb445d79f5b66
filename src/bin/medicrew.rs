use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::sync::Arc;

use medicrew_client::auth::AuthState;
use medicrew_client::config::ClientConfig;
use medicrew_client::guards::{GuardChain, GuardDecision};
use medicrew_client::http::{ApiClient, RequestOptions};
use medicrew_client::navigation::HistoryNavigator;
use medicrew_client::routes::RouteTable;
use medicrew_client::services::{landing_path, AuthService};
use medicrew_client::storage::FileStore;
use medicrew_client::Result;

#[derive(Parser)]
#[command(name = "medicrew", about = "Medicrew portal client", version)]
struct Cli {
    /// Location the client acts from; used as the return target on redirects
    #[arg(long, default_value = "/")]
    location: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the current session may open a portal path
    Guard { path: String },
    /// Show the stored session
    Whoami,
    /// Log in and store the session
    Login {
        #[arg(long)]
        id: String,
        #[arg(long)]
        password: String,
    },
    /// GET an endpoint and print the JSON response
    Get {
        endpoint: String,
        /// Query parameter as key=value, repeatable
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
    },
    /// Clear the stored session and tokens
    Logout,
}

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: api={}, timeout={}ms, storage={}",
        config.api_base_url,
        config.request_timeout.as_millis(),
        config.storage_path.display()
    );

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let storage = Arc::new(FileStore::new(config.storage_path.clone()));
    let auth = AuthState::hydrated(storage);
    let navigator = Arc::new(HistoryNavigator::new(cli.location.clone()));

    match cli.command {
        Command::Guard { path } => {
            let chain = GuardChain::new(config.feature_flags.clone());
            match chain.authorize(&auth, &RouteTable::portal(), &path) {
                GuardDecision::Allow => println!("allow {}", path),
                GuardDecision::Pending => println!("pending {}", path),
                GuardDecision::Redirect(navigation) => {
                    println!("redirect {} ({})", navigation.location(), navigation.reason);
                    if let Some(message) = &navigation.message {
                        println!("  {}", message);
                    }
                }
            }
        }
        Command::Whoami => match auth.current_user() {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
                println!(
                    "  role={} license={} organization={}",
                    user.role(),
                    user.license(),
                    user.current_account.organization_name
                );
                println!("  premium={}", auth.is_premium_user());
            }
            None => println!("not logged in"),
        },
        Command::Login { id, password } => {
            let client = ApiClient::from_config(&config, auth, navigator.clone());
            let user = AuthService::new(client).login(&id, &password).await?;
            println!("logged in as {} ({})", user.name, user.role());
            println!("continue at {}", landing_path(user.role()));
        }
        Command::Get { endpoint, params } => {
            let client = ApiClient::from_config(&config, auth, navigator.clone());
            let mut options = RequestOptions::new();
            for param in &params {
                match param.split_once('=') {
                    Some((key, value)) => options = options.param(key, value),
                    None => warn!("Ignoring malformed parameter '{}'", param),
                }
            }

            let result: Result<serde_json::Value> = client.get(&endpoint, options).await;
            if let Some(navigation) = navigator.last() {
                println!("navigate {}", navigation.location());
            }
            let body = result?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Logout => {
            auth.logout();
            println!("logged out");
        }
    }

    Ok(())
}

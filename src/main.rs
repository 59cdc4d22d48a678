//! Keepsake CLI - standalone server for the personal memories API

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keepsake::{api, Config, Database};

#[derive(Parser, Debug)]
#[command(name = "keepsake")]
#[command(version)]
#[command(about = "Keepsake - self-hosted personal memories API", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.keepsake/config.toml")]
    config: PathBuf,

    /// Override server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Override database file path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Override the JWT verification secret
    #[arg(long, env = "KEEPSAKE_JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults and exit
    #[arg(long)]
    init: bool,

    /// Decode the display identity (sub/name/avatar) from a token and exit.
    /// Does not verify the signature; display use only.
    #[arg(long, value_name = "TOKEN")]
    whoami: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("keepsake={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Handle --whoami flag (mirrors the web client's cookie decode)
    if let Some(token) = args.whoami {
        let claims = api::auth::decode_display_claims(&token)?;
        println!("sub:    {}", claims.sub);
        println!("name:   {}", claims.name.as_deref().unwrap_or("-"));
        println!("avatar: {}", claims.avatar_url.as_deref().unwrap_or("-"));
        return Ok(());
    }

    // Handle --init flag
    if args.init {
        let config_path = expand_path(&args.config);
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let config_path = expand_path(&args.config);
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        tracing::warn!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(secret) = args.jwt_secret {
        config.auth.secret = Some(secret);
    }

    let db_path = args.db.unwrap_or_else(|| config.db_path());
    let db = Arc::new(Database::new(db_path)?);
    tracing::info!("Database ready at {}", db.path().display());

    // Start API server (blocks until shutdown)
    api::serve(config.server_addr()?, db, &config).await?;

    Ok(())
}

/// Expand ~ to home directory
fn expand_path(path: &PathBuf) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap());
        }
    }
    path.clone()
}

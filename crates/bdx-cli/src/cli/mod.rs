//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use bdx_client::config::paths;
use bdx_client::{ApiClient, Config, SessionStore};

mod commands;

#[derive(Parser)]
#[command(name = "bdx")]
#[command(version)]
#[command(about = "Live auction client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the backend base URL from config
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Register the account first (re-registration conflicts are ignored)
        #[arg(long)]
        register: bool,
    },
    /// Revoke the refresh token and clear the local session
    Logout,
    /// Register a new account without logging in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List all auction items
    Items,
    /// Show the current user's active auction, if any
    Active,
    /// Create a new auction item
    Create {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_name = "PRICE")]
        base_price: f64,
        /// Closing time, RFC 3339 (e.g. 2026-09-01T18:00:00Z)
        #[arg(long, value_name = "WHEN")]
        close_at: String,
    },
    /// Follow one auction live, printing events until it closes
    Watch {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
    },
    /// Join an auction before it starts
    Join {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
    },
    /// Leave an auction before it starts
    Leave {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
    },
    /// Place a bid on a running auction
    Bid {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
        #[arg(value_name = "AMOUNT")]
        amount: f64,
        /// Upper budget for auto-bidding
        #[arg(long, value_name = "AMOUNT")]
        max_budget: Option<f64>,
        /// Auto-bid increment
        #[arg(long, value_name = "AMOUNT")]
        step: Option<f64>,
    },
    /// Close an auction now and print the winner
    Close {
        #[arg(value_name = "ITEM_ID")]
        item_id: i64,
    },
    /// Show the current user's won-item inventory
    Inventory,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("load config")?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }

    let store = Arc::new(SessionStore::open(paths::session_dir()).context("open session store")?);
    let client = Arc::new(
        ApiClient::with_timeout(&config.base_url, store, config.request_timeout())
            .context("build api client")?,
    );

    match cli.command {
        Commands::Login {
            email,
            password,
            register,
        } => commands::auth::login(&client, &email, &password, register).await,
        Commands::Logout => commands::auth::logout(&client).await,
        Commands::Register { email, password } => {
            commands::auth::register(&client, &email, &password).await
        }
        Commands::Inventory => commands::auth::inventory(&client).await,

        Commands::Items => commands::items::list(&client).await,
        Commands::Active => commands::items::active(&client).await,
        Commands::Create {
            title,
            description,
            base_price,
            close_at,
        } => commands::items::create(&client, &title, &description, base_price, &close_at).await,
        Commands::Join { item_id } => commands::items::join(&client, item_id).await,
        Commands::Leave { item_id } => commands::items::leave(&client, item_id).await,
        Commands::Bid {
            item_id,
            amount,
            max_budget,
            step,
        } => commands::items::bid(&client, item_id, amount, max_budget, step).await,
        Commands::Close { item_id } => commands::items::close(&client, item_id).await,

        Commands::Watch { item_id } => commands::watch::run(client, item_id, &config).await,
    }
}

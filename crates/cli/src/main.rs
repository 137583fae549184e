//! `LoveSense` CLI - operator tools for the bot's stores.
//!
//! # Usage
//!
//! ```bash
//! # Inspect users
//! ls-cli users list
//! ls-cli users show 123456789
//!
//! # Grant or revoke premium
//! ls-cli premium grant 123456789 --days 30
//! ls-cli premium revoke 123456789
//!
//! # Decide payment claims
//! ls-cli orders list --pending
//! ls-cli orders approve man_0192f3a4...
//! ls-cli orders reject man_0192f3a4...
//! ls-cli orders purge 123456789
//!
//! # Dashboard and action log
//! ls-cli stats
//! ls-cli logs --lines 50
//! ```
//!
//! Every command acts as `ADMIN_ID` and goes through the same admin gate as
//! the bot. Store writes take the same file locks as the bot, so the CLI can
//! run while the bot is up.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ls-cli")]
#[command(author, version, about = "LoveSense bot operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect user records
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Grant or revoke premium
    Premium {
        #[command(subcommand)]
        action: PremiumAction,
    },
    /// List and decide payment claims
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Show dashboard counters
    Stats,
    /// Show the tail of the action log
    Logs {
        /// Number of lines to show
        #[arg(short, long, default_value_t = 50)]
        lines: usize,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List users (first 100)
    List,
    /// Show one user record
    Show {
        /// Telegram user id
        uid: String,
    },
}

#[derive(Subcommand)]
enum PremiumAction {
    /// Grant premium starting now
    Grant {
        /// Telegram user id
        uid: String,

        /// Length of the grant in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Revoke premium
    Revoke {
        /// Telegram user id
        uid: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first (latest 50)
    List {
        /// Only show orders awaiting a decision
        #[arg(long)]
        pending: bool,
    },
    /// Approve a claim and grant 30 days of premium
    Approve {
        /// Order id
        order_id: String,
    },
    /// Reject a claim, removing the user's pending orders
    Reject {
        /// Order id
        order_id: String,
    },
    /// Remove every order of a user
    Purge {
        /// Telegram user id
        uid: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lovesense_cli=info,lovesense_bot=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let ctx = commands::Context::open().await?;
    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list(&ctx).await?,
            UsersAction::Show { uid } => commands::users::show(&ctx, &uid).await?,
        },
        Commands::Premium { action } => match action {
            PremiumAction::Grant { uid, days } => {
                commands::premium::grant(&ctx, &uid, days).await?;
            }
            PremiumAction::Revoke { uid } => commands::premium::revoke(&ctx, &uid).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { pending } => commands::orders::list(&ctx, pending).await?,
            OrdersAction::Approve { order_id } => {
                commands::orders::approve(&ctx, &order_id).await?;
            }
            OrdersAction::Reject { order_id } => {
                commands::orders::reject(&ctx, &order_id).await?;
            }
            OrdersAction::Purge { uid } => commands::orders::purge(&ctx, &uid).await?,
        },
        Commands::Stats => commands::stats(&ctx).await?,
        Commands::Logs { lines } => commands::logs(&ctx, lines).await?,
    }
    Ok(())
}

//! CLI command definitions and dispatch.

pub mod account;
pub mod admin;
pub mod catalog;
pub mod inbox;
pub mod rows;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::app_system::MarketSystem;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::feedback::TerminalNotifier;
use crate::output::OutputFormat;

/// Maalem Market: handicraft marketplace from the terminal
#[derive(Debug, Parser)]
#[command(name = "maalem-market", version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides MARKET_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in as a client, maalem or admin
    Login(account::LoginArgs),
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create a client or maalem account and log in
    Register(account::RegisterArgs),
    /// Client profile management
    Profile(account::ProfileArgs),
    /// Browse products
    Products(catalog::ProductsArgs),
    /// Product details: prices, likes, comments and artisan
    Product {
        /// Item id
        id: u64,
    },
    /// List artisans
    Maalems,
    /// Artisan profile and products
    Maalem {
        /// Maalem id
        id: u64,
    },
    /// Like an item, or unlike it if already liked
    Like {
        /// Item id
        item: u64,
    },
    /// Comment on an item
    Comment {
        /// Item id
        item: u64,
        /// Comment text
        text: String,
    },
    /// Make an offer on an item
    Offer(catalog::OfferArgs),
    /// Offers you have made
    MyOffers,
    /// Items you sell
    MyProducts,
    /// List a new item for sale
    AddProduct(catalog::AddProductArgs),
    /// Administration
    Admin(admin::AdminArgs),
    /// Show your notifications and mark them read
    Notifications,
    /// Unread notification count
    Unread {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let mut config = AppConfig::from_env()?;
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url)?;
        }
        let mut system = MarketSystem::start(config, Arc::new(TerminalNotifier)).await?;

        let result = self.dispatch(&mut system).await;
        system.shutdown().await?;
        result
    }

    async fn dispatch(&self, system: &mut MarketSystem) -> AppResult<()> {
        let format = self.format;
        match &self.command {
            Commands::Login(args) => account::login(args, system, format).await,
            Commands::Logout => account::logout(system).await,
            Commands::Whoami => account::whoami(system, format).await,
            Commands::Register(args) => account::register(args, system, format).await,
            Commands::Profile(args) => account::profile(args, system, format).await,
            Commands::Products(args) => catalog::products(args, system, format).await,
            Commands::Product { id } => catalog::product(*id, system, format).await,
            Commands::Maalems => catalog::maalems(system, format).await,
            Commands::Maalem { id } => catalog::maalem(*id, system, format).await,
            Commands::Like { item } => catalog::like(*item, system).await,
            Commands::Comment { item, text } => catalog::comment(*item, text, system, format).await,
            Commands::Offer(args) => catalog::offer(args, system, format).await,
            Commands::MyOffers => catalog::my_offers(system, format).await,
            Commands::MyProducts => catalog::my_products(system, format).await,
            Commands::AddProduct(args) => catalog::add_product(args, system, format).await,
            Commands::Admin(args) => admin::execute(args, system, format).await,
            Commands::Notifications => inbox::notifications(system, format).await,
            Commands::Unread { watch } => inbox::unread(*watch, system).await,
        }
    }
}

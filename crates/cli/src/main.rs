//! Soft Shop CLI - browse the catalog, manage the cart, check out.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from SHOP_PASSWORD or prompted)
//! shop login -u alice
//!
//! # List products, optionally filtered
//! shop products --filter apple
//!
//! # Type filters line by line; searches are debounced
//! shop search
//!
//! # Cart
//! shop cart add apple
//! shop cart remove apple
//! shop cart show
//!
//! # Place the order
//! shop checkout --city Athens --area Plaka --code 10558 --street Adrianou --street-number 12
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` - Manage the server session
//! - `products` - Show one page of the catalog
//! - `search` - Interactive debounced search
//! - `cart` - Show, add to, or remove from the cart
//! - `checkout` - Confirm and submit the order

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use soft_shop_storefront::api::ShopClient;
use soft_shop_storefront::config::ShopConfig;
use soft_shop_storefront::error::StorefrontError;
use soft_shop_storefront::storage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Soft Shop storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the storefront
    Login {
        /// Username (defaults to SHOP_USERNAME)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the product list
    Products {
        /// Search filter
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Search interactively: each stdin line replaces the filter
    Search,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Confirm and place the order
    Checkout(CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product by name
    Add {
        /// Product name (its unique key)
        name: String,
    },
    /// Remove every entry of a product by name
    Remove {
        /// Product name (its unique key)
        name: String,
    },
}

/// Address form fields.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    city: String,
    #[arg(long)]
    area: String,
    #[arg(long)]
    code: i64,
    #[arg(long)]
    street: String,
    #[arg(long)]
    street_number: i64,
    /// Answer "Yes" to the confirmation without asking
    #[arg(short, long)]
    yes: bool,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ShopConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr; stdout is for output.
fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "soft_shop_storefront=info,soft_shop_cli=info".into());
    let json = std::env::var("SHOP_LOG_FORMAT").is_ok_and(|format| format == "json");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ShopConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            StorefrontError::from(e).report();
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        e.report();
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ShopConfig) -> Result<(), StorefrontError> {
    let storage = storage::install_configured(&config).clone();
    let client = ShopClient::new(&config, storage.clone())?;
    let ctx = commands::Context {
        config,
        storage,
        client,
    };

    match cli.command {
        Commands::Login { username } => commands::session::login(&ctx, username).await?,
        Commands::Logout => commands::session::logout(&ctx).await?,
        Commands::Products { filter } => commands::products::list(&ctx, filter).await?,
        Commands::Search => commands::products::search(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add { name } => commands::cart::add(&ctx, &name).await?,
            CartAction::Remove { name } => commands::cart::remove(&ctx, &name)?,
        },
        Commands::Checkout(args) => commands::checkout::run(&ctx, args).await?,
    }
    Ok(())
}

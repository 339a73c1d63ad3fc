//! Funnels CLI - tools for preparing and checking landing page inputs.
//!
//! # Usage
//!
//! ```bash
//! # Check a CMS document and list the sections it renders
//! funnels-cli cms validate page.json
//!
//! # Write the static product blob for a product handle
//! funnels-cli product pull --handle the-complete-snowboard --out crates/storefront/content/product.json
//!
//! # Show variants, prices and discounts from a blob
//! funnels-cli product inspect crates/storefront/content/product.json
//!
//! # Fetch a cart by id
//! funnels-cli cart show --cart-id gid://shopify/Cart/abc
//! ```
//!
//! Commands that talk to Shopify read `SHOPIFY_STORE`,
//! `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` and `SHOPIFY_API_VERSION` from the
//! environment (or `.env`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "funnels-cli")]
#[command(author, version, about = "Funnels landing page tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with CMS documents
    Cms {
        #[command(subcommand)]
        action: CmsAction,
    },
    /// Produce and inspect the static product blob
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect Shopify carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CmsAction {
    /// Validate a CMS document and list its sections
    Validate {
        /// Path to the JSON document
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Fetch a product from the Storefront API and write the blob
    Pull {
        /// Product handle
        #[arg(long)]
        handle: String,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Store id recorded in the blob (scopes the cart cookie)
        #[arg(long, env = "FUNNELS_STORE_ID")]
        store_id: Option<String>,
    },
    /// Print variants, prices and discounts from a blob
    Inspect {
        /// Path to the product blob
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Fetch and print a cart
    Show {
        /// Cart GID
        #[arg(long)]
        cart_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cms { action } => match action {
            CmsAction::Validate { file } => commands::cms::validate(&file)?,
        },
        Commands::Product { action } => match action {
            ProductAction::Pull {
                handle,
                out,
                store_id,
            } => commands::product::pull(&handle, &out, store_id).await?,
            ProductAction::Inspect { file } => commands::product::inspect(&file)?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show { cart_id } => commands::cart::show(&cart_id).await?,
        },
    }
    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shelf::catalog::{Book, Catalog, CatalogClient};
use shelf::config::Config;
use shelf::download::download_book;
use shelf::history::CatalogHistory;
use shelf::util::{strip_control_chars, truncate_to_width, validate_url};

/// Column width for titles and authors in listings.
const LIST_WIDTH: usize = 72;

/// Get the default config file path (~/.config/shelf/config.toml)
fn get_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("shelf")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "shelf", about = "Browse OPDS catalogs and download EPUBs")]
struct Args {
    /// Config file (defaults to ~/.config/shelf/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a catalog and list its books
    Browse {
        url: String,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow the catalog link of book N (1-based) and list that catalog
    Open { url: String, n: usize },
    /// Download the EPUB of book N (1-based)
    Download {
        url: String,
        n: usize,

        /// Target directory (overrides download_dir from the config file)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

// Single-threaded so the per-entry fan-out interleaves cooperatively.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only catalog output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let http = config.http_client().context("Failed to build HTTP client")?;
    let client = CatalogClient::new(http, config.fetch_settings());

    match args.command {
        Command::Browse { url, json } => {
            let catalog = load_root(&client, &config, &url).await?;
            if json {
                let out = serde_json::to_string_pretty(&catalog)
                    .context("Failed to serialize catalog")?;
                println!("{}", out);
            } else {
                print_catalog(&catalog);
            }
        }
        Command::Open { url, n } => {
            let mut history = CatalogHistory::new();
            history.reset(load_root(&client, &config, &url).await?);

            let target = history
                .current()
                .map(|catalog| select_book(catalog, n))
                .transpose()?
                .and_then(|book| book.catalog_url.clone())
                .ok_or_else(|| anyhow::anyhow!("Book {} has no catalog to open", n))?;

            let catalog = client.fetch_catalog(&target).await.map_err(|e| {
                tracing::error!(url = %target, error = %e, "Failed to load catalog");
                anyhow::anyhow!(e)
            })?;
            history.push(catalog);

            if let Some(catalog) = history.current() {
                print_catalog(catalog);
            }
        }
        Command::Download { url, n, dir } => {
            let catalog = load_root(&client, &config, &url).await?;
            let book = select_book(&catalog, n)?;
            let dir = dir.unwrap_or_else(|| config.download_dir());

            let path = download_book(client.http(), book, &config.download_settings(), &dir)
                .await
                .with_context(|| format!("Failed to download \"{}\"", book.title))?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

/// Validates a user-supplied root URL and loads its catalog.
async fn load_root(client: &CatalogClient, config: &Config, url: &str) -> Result<Catalog> {
    let url = validate_url(url, config.allow_private_hosts).context("Invalid catalog URL")?;

    client.fetch_catalog(url.as_str()).await.map_err(|e| {
        tracing::error!(url = %url, kind = ?e.kind(), error = %e, "Failed to load catalog");
        anyhow::anyhow!(e)
    })
}

fn select_book(catalog: &Catalog, n: usize) -> Result<&Book> {
    n.checked_sub(1)
        .and_then(|i| catalog.books.get(i))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No book {} in catalog (it has {} books)",
                n,
                catalog.books.len()
            )
        })
}

fn print_catalog(catalog: &Catalog) {
    println!("{}", strip_control_chars(&catalog.title));
    if let Some(updated) = &catalog.updated {
        println!("Updated: {}", strip_control_chars(updated));
    }
    println!();

    if catalog.books.is_empty() {
        println!("(no books)");
        return;
    }

    for (i, book) in catalog.books.iter().enumerate() {
        let title = strip_control_chars(&book.title);
        let author = strip_control_chars(&book.author);
        println!("{:>3}. {}", i + 1, truncate_to_width(&title, LIST_WIDTH));
        println!("     by {}", truncate_to_width(&author, LIST_WIDTH));
        if let Some(cover) = &book.cover_url {
            println!("     cover:    {}", cover);
        }
        if let Some(download) = &book.download_url {
            println!("     download: {}", download);
        }
        for alt in &book.alternate_downloads {
            println!("     {}: {}", strip_control_chars(alt.label()), alt.href);
        }
        if let Some(catalog_url) = &book.catalog_url {
            println!("     catalog:  {}", catalog_url);
        }
    }
}

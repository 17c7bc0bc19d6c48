mod cli;

use booksearch::{config, providers, server};

use anyhow::Result;
use booksearch_common::SearchResult;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting booksearch server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let search = providers::build_search_context(&config)?;
    server::start_server(server::AppContext::new(config, search)).await
}

async fn run_search(
    by: &str,
    query: &str,
    page: u32,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let search = providers::build_search_context(&config)?;

    let result = search.search(by, query, page).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &SearchResult) {
    println!("Search: {} = {:?}", result.filter, result.query);
    println!(
        "Page {} of {} ({} results, {} shown)",
        result.current_page,
        result.total_pages,
        result.total_results,
        result.shown_results()
    );

    for (i, record) in result.items.iter().enumerate() {
        let book = &record.book;
        println!();
        println!(
            "  [{}] {}",
            i + 1,
            book.title_long
                .as_deref()
                .or(book.title.as_deref())
                .unwrap_or("(untitled)")
        );
        if let Some(ref authors) = book.authors_text {
            println!("      by {}", authors);
        }
        if let Some(ref publisher) = book.publisher {
            println!("      {}", publisher);
        }
        if let Some(ref isbn) = book.isbn {
            print!("      ISBN {}", isbn);
            if let Some(pages) = record.extra.page_count {
                print!(", {} pages", pages);
            }
            if let Some(rating) = record.extra.average_rating {
                print!(", rated {:.1}", rating);
                if let Some(count) = record.extra.ratings_count {
                    print!(" ({} ratings)", count);
                }
            }
            println!();
        }
    }

    if result.has_more_pages() {
        println!("\nMore results: use --page {}", result.current_page + 1);
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!(
                "  Cache: {} entries, {}s TTL",
                config.cache.capacity, config.cache.ttl_secs
            );
            println!("  Fetch timeout: {}s", config.fetch.timeout_secs);
            println!(
                "  ISBNdb: {} ({} req/s)",
                config.isbndb.base_url, config.isbndb.requests_per_second
            );
            println!(
                "  Google Books: {} ({} req/s)",
                config.google_books.base_url, config.google_books.requests_per_second
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "booksearch=debug,booksearch_engine=debug,booksearch_common=debug,tower_http=debug"
                .to_string()
        } else {
            "booksearch=info,booksearch_engine=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Search {
            by,
            query,
            page,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_search(&by, &query, page, json, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("booksearch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

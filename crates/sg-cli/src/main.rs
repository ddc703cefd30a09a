//! shopgrid command line
//!
//! Lists an admin grid page from the database, or prints the SQL that
//! would run for it.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sg_core::config::AppConfig;
use sg_core::{Id, Pagination};
use sg_db::{Database, GridListing, PgDatastore};
use sg_queries::{grids, QueryComposer, ScopeContext, SearchCriteria, SelectQuery};

#[derive(Parser, Debug)]
#[command(name = "shopgrid", version, about = "Query back-office admin grids")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page of a grid and print it as JSON
    List(GridArgs),
    /// Print the list and count SQL with their parameters
    Sql(GridArgs),
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Grid name
    grid: String,

    /// JSON file with filters, sorting and pagination
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Language id for localized lookups
    #[arg(long, env = "SHOPGRID_LANG_ID")]
    lang: Option<Id>,

    /// Allowed shop id (repeatable)
    #[arg(long = "shop")]
    shops: Vec<Id>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::List(args) => list(&config, &args).await,
        Command::Sql(args) => print_sql(&config, &args),
    }
}

fn init_tracing() {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,sg_cli=debug,sg_db=debug".into()),
    );

    // stdout carries the command output, logs go to stderr
    if std::env::var("SHOPGRID_LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn list(config: &AppConfig, args: &GridArgs) -> anyhow::Result<()> {
    let composer = composer(config, args)?;
    let criteria = criteria(config, args)?;

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    info!(grid = composer.grid().name, "Connected to database");

    let listing = GridListing::new(PgDatastore::new(db.pool().clone()));
    let result = listing.list(&composer, &criteria).await;
    db.close().await;

    let page = result?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn print_sql(config: &AppConfig, args: &GridArgs) -> anyhow::Result<()> {
    let composer = composer(config, args)?;
    let criteria = criteria(config, args)?;

    let list = composer.build_list_query(&criteria)?;
    let count = composer.build_count_query(&criteria)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "list": describe(&list),
            "count": describe(&count),
        }))?
    );
    Ok(())
}

fn describe(query: &SelectQuery) -> serde_json::Value {
    serde_json::json!({
        "sql": query.to_sql(),
        "params": query.params(),
    })
}

fn composer(config: &AppConfig, args: &GridArgs) -> anyhow::Result<QueryComposer> {
    let grid = grids::by_name(&args.grid).with_context(|| {
        format!(
            "unknown grid '{}' (available: {})",
            args.grid,
            grids::names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let shops = if args.shops.is_empty() {
        config.context.shop_ids.clone()
    } else {
        args.shops.clone()
    };
    let lang = args.lang.unwrap_or(config.context.lang_id);

    Ok(QueryComposer::new(
        grid,
        config.grid.table_prefix.clone(),
        ScopeContext::new(shops, lang),
    ))
}

/// Read criteria from file; missing pagination gets the default page size, larger pages are capped
fn criteria(config: &AppConfig, args: &GridArgs) -> anyhow::Result<SearchCriteria> {
    let mut criteria = match &args.criteria {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<SearchCriteria>(&raw)
                .with_context(|| format!("invalid criteria in {}", path.display()))?
        }
        None => SearchCriteria::new(),
    };

    criteria.pagination = Some(match criteria.pagination {
        Some(p) => Pagination::new(p.page_index, p.page_size.min(config.grid.max_page_size)),
        None => Pagination::new(0, config.effective_page_size(None)),
    });

    Ok(criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(grid: &str) -> GridArgs {
        GridArgs {
            grid: grid.to_string(),
            criteria: None,
            lang: None,
            shops: vec![],
        }
    }

    #[test]
    fn test_cli_parses_repeated_shops() {
        let cli = Cli::parse_from(["shopgrid", "sql", "employee", "--shop", "1", "--shop", "3"]);
        match cli.command {
            Command::Sql(args) => assert_eq!(args.shops, vec![1, 3]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_default_page_comes_from_config() {
        let config = AppConfig::default();
        let criteria = criteria(&config, &args("employee")).unwrap();
        assert_eq!(criteria.pagination, Some(Pagination::new(0, 50)));
    }

    #[test]
    fn test_unknown_grid() {
        let err = composer(&AppConfig::default(), &args("carts")).unwrap_err();
        assert!(err.to_string().contains("available: employee"));
    }

    #[test]
    fn test_scope_falls_back_to_config() {
        let composer = composer(&AppConfig::default(), &args("employee")).unwrap();
        assert_eq!(composer.scope().shop_ids(), &[1]);
        assert_eq!(composer.scope().lang_id(), 1);
    }
}

//! Harvester CLI
//!
//! Crawls tags or items into the local database, or removes them from it.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use harvester::{
    browser::HttpDriver,
    error::Result,
    models::Config,
    pipeline::{self, Operation, RunContext},
    storage::Store,
    utils::http,
};

/// Harvester - catalogue tag reconciler
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Reconciles catalogue listings into a local item/tag/author graph"
)]
#[command(group(
    ArgGroup::new("operation")
        .required(true)
        .args(["tag", "item", "remove_tag", "remove_item"])
))]
struct Cli {
    /// Crawl the given tag(s)
    #[arg(short, long, num_args = 1.., value_name = "TAG")]
    tag: Option<Vec<String>>,

    /// Reconcile the given item id(s) from their detail pages
    #[arg(short = 'r', long, num_args = 1.., value_name = "ID")]
    item: Option<Vec<String>>,

    /// Remove the tag(s) with the given display label(s)
    #[arg(long, visible_alias = "rt", num_args = 1.., value_name = "LABEL")]
    remove_tag: Option<Vec<String>>,

    /// Remove the given item id(s)
    #[arg(long, visible_alias = "rr", num_args = 1.., value_name = "ID")]
    remove_item: Option<Vec<String>>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable trace logging
    #[arg(short, long)]
    debug: bool,

    /// Fetch detail pages for every item, however well tagged
    #[arg(short, long)]
    force: bool,

    /// Path to the configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Database file (overrides database.path)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let operation = Operation::from_flags(cli.tag, cli.item, cli.remove_tag, cli.remove_item)?;

    let mut config = Config::load_or_default(&cli.config);
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let store = Store::open(&config.database.path).await?;
    let ctx = RunContext::new(store, config);
    log::info!("Harvester starting (run at {})", ctx.run_at);

    // One session for listing pages, one for detail pages, sharing a client.
    let client = http::create_client(&ctx.config.crawler)?;
    let mut listing = HttpDriver::with_client(client.clone());
    let mut detail = HttpDriver::with_client(client);
    let result = pipeline::run(&ctx, &operation, &mut listing, &mut detail, cli.force).await;

    match &result {
        Ok(()) => {
            let counts = ctx.store.counts().await?;
            log::info!(
                "Done! {} items, {} tags, {} authors, {} tag links, {} author links",
                counts.items,
                counts.tags,
                counts.authors,
                counts.item_tags,
                counts.item_authors
            );
        }
        Err(e) => log::error!("Run aborted: {}", e),
    }
    ctx.store.close().await;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_operation_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["harvester", "-t", "a", "-r", "1"]).is_err());
        assert!(Cli::try_parse_from(["harvester", "-v"]).is_err());
    }

    #[test]
    fn test_short_aliases() {
        let cli = Cli::try_parse_from(["harvester", "--rt", "NEMS", "MEMS", "-v"]).unwrap();
        assert_eq!(
            cli.remove_tag,
            Some(vec!["NEMS".to_string(), "MEMS".to_string()])
        );
        assert!(cli.verbose);

        let cli = Cli::try_parse_from(["harvester", "--rr", "42", "--db", "x.db"]).unwrap();
        assert_eq!(cli.remove_item, Some(vec!["42".to_string()]));
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
    }

    #[test]
    fn test_tag_crawl_flags() {
        let cli =
            Cli::try_parse_from(["harvester", "-t", "quantum dots", "graphene", "-f"]).unwrap();
        assert_eq!(
            cli.tag,
            Some(vec!["quantum dots".to_string(), "graphene".to_string()])
        );
        assert!(cli.force);
        assert_eq!(cli.config, PathBuf::from("harvester.toml"));
    }
}

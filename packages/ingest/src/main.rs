#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the per-game stats scraper.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use nba_stats_database::db::Destination;
use nba_stats_ingest::export::{ExportFormat, export_records};
use nba_stats_ingest::{DEFAULT_SEASON, collect, dry_run, resolve_url, run};
use nba_stats_models::TableSchema;
use nba_stats_scraper::fetch::Fetcher;
use nba_stats_source::registry::{self, DEFAULT_SCHEMA_ID};

#[derive(Parser)]
#[command(name = "nba_stats_ingest", about = "NBA per-game stats scraper")]
struct Cli {
    #[command(flatten)]
    page: PageArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct PageArgs {
    /// Table schema id (see `schemas`)
    #[arg(long, global = true, default_value = DEFAULT_SCHEMA_ID)]
    schema: String,
    /// Season to scrape, as the year it ends in (e.g. 2024 for 2023-24)
    #[arg(long, global = true, default_value_t = DEFAULT_SEASON)]
    season: u16,
    /// Page URL (overrides --season)
    #[arg(long, global = true)]
    url: Option<String>,
    /// Read a saved HTML page instead of fetching over HTTP
    #[arg(long, global = true)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the table and replace the destination table (default)
    Sync {
        /// Destination table (defaults to the schema's destination)
        #[arg(long)]
        table: Option<String>,
        /// `DuckDB` file to write (overrides `NBA_STATS_DUCKDB`; ignored when
        /// `DB_HOST` selects MySQL)
        #[arg(long)]
        duckdb: Option<PathBuf>,
        /// Stop after normalization; don't touch the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Scrape the table and write the records to a file
    Export {
        /// Output file
        #[arg(long, short)]
        output: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// List the embedded table schemas
    Schemas,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = execute(cli).await;
    if let Err(e) = &result {
        log::error!("{e}");
    }
    result
}

async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.unwrap_or(Commands::Sync {
        table: None,
        duckdb: None,
        dry_run: false,
    });

    match command {
        Commands::Schemas => {
            for schema in registry::all_schemas()? {
                print_schema(&schema);
            }
        }
        Commands::Sync {
            table,
            duckdb,
            dry_run: dry,
        } => {
            let start = Instant::now();
            let schema = registry::schema(&cli.page.schema)?;
            let url = resolve_url(&schema, cli.page.season, cli.page.url)?;
            let fetcher = Fetcher::from_input(cli.page.input);
            let table = table.unwrap_or_else(|| schema.destination.clone());

            let summary = if dry {
                dry_run(&fetcher, &url, &schema).await?
            } else {
                let destination = Destination::from_env(duckdb)?;
                log::info!("Destination: {destination}");
                let mut sink = destination.open()?.with_source_url(url.as_str());
                run(&fetcher, &mut sink, &url, &schema, &table).await?
            };

            println!("{summary}");
            log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
        }
        Commands::Export { output, format } => {
            let schema = registry::schema(&cli.page.schema)?;
            let url = resolve_url(&schema, cli.page.season, cli.page.url)?;
            let fetcher = Fetcher::from_input(cli.page.input);

            let collected = collect(&fetcher, &url, &schema).await?;
            export_records(&output, format, &collected.records)?;

            println!(
                "{} records, {} warnings, table found in {} of {}; wrote {}",
                collected.records.len(),
                collected.warnings.len(),
                collected.location,
                collected.source,
                output.display()
            );
        }
    }

    Ok(())
}

fn print_schema(schema: &TableSchema) {
    println!("{} ({})", schema.id, schema.name);
    println!("  table id:    {}", schema.table_id);
    println!("  destination: {}", schema.destination);
    if let Some(template) = &schema.url_template {
        println!("  url:         {template}");
    }
    println!("  {:<8} {:<32} KIND", "LABEL", "COLUMN");
    for column in &schema.columns {
        println!(
            "  {:<8} {:<32} {}",
            column.label,
            column.field.column_name(),
            column.field.kind()
        );
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use food_catalog::config::Config;
use food_catalog::{
    db, find_categories, find_subcategories, find_units, import_csv, logging, CategoryFilter,
    RequestScope, Session, SubcategoryFilter, UnitFilter,
};

#[derive(Parser, Debug)]
#[command(name = "food-catalog")]
#[command(version, about = "Food catalog maintenance", long_about = None)]
struct Cli {
    /// Config file; defaults to food-catalog.yaml in the working directory or $HOME.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the config file.
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema
    Init,
    /// Load categories, subcategories and units from a CSV file
    Import { csv: PathBuf },
    /// Print the first page of an entity as JSON
    List {
        #[arg(value_enum)]
        entity: Entity,
        /// 1-100, default 50
        #[arg(long)]
        limit: Option<String>,
        #[arg(long)]
        skip: Option<String>,
        /// "<field> <direction>", may be repeated
        #[arg(long = "order-by")]
        order_by: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Entity {
    Categories,
    Subcategories,
    Units,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    logging::init(&config.logger)?;

    let conn = db::open(&config.database)?;
    let session = Session::unbounded(&conn);

    match cli.command {
        Command::Init => {
            println!("✓ Database ready: {}", config.database.display());
        }
        Command::Import { csv } => {
            let report = import_csv(&session, &csv)?;
            println!(
                "✓ Imported {}: {} created, {} skipped",
                csv.display(),
                report.created,
                report.skipped
            );
        }
        Command::List {
            entity,
            limit,
            skip,
            order_by,
        } => {
            let json = match entity {
                Entity::Categories => {
                    let scope = RequestScope::from_parts(
                        limit.as_deref(),
                        skip.as_deref(),
                        &order_by,
                        CategoryFilter::default(),
                    );
                    serde_json::to_string_pretty(&find_categories(&session, &scope)?)?
                }
                Entity::Subcategories => {
                    let scope = RequestScope::from_parts(
                        limit.as_deref(),
                        skip.as_deref(),
                        &order_by,
                        SubcategoryFilter::default(),
                    );
                    serde_json::to_string_pretty(&find_subcategories(&session, &scope)?)?
                }
                Entity::Units => {
                    let scope = RequestScope::from_parts(
                        limit.as_deref(),
                        skip.as_deref(),
                        &order_by,
                        UnitFilter::default(),
                    );
                    serde_json::to_string_pretty(&find_units(&session, &scope)?)?
                }
            };
            println!("{json}");
        }
    }

    Ok(())
}

//! Craft Planner
//!
//! Plans crafting trees and shopping lists against a recipe service.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use craft_planner::config::{self, Config};
use craft_planner::parse::{normalize_name, parse_item_lines};
use craft_planner::service::HttpRecipeService;
use craft_planner::session::Session;
use craft_planner::{db, report};

#[derive(Parser)]
#[command(name = "craft-planner")]
#[command(about = "Recipe tree planner and shopping list calculator")]
struct Cli {
    /// Base URL of the recipe service
    #[arg(long, env = "CRAFT_API_URL", default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Game data version
    #[arg(short = 'g', long, env = "CRAFT_GAME_VERSION", default_value = config::DEFAULT_GAME_VERSION)]
    game_version: String,

    /// Path to the SQLite preference database
    #[arg(short, long, env = "CRAFT_DATABASE", default_value = config::DEFAULT_DATABASE)]
    database: PathBuf,

    /// Request timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the items available in the game version
    Items,

    /// Plan a build for some items (e.g. "8 oak_log" "torch 2" "#planks 4")
    Plan {
        #[arg(required = true)]
        lines: Vec<String>,
    },

    /// Pick an alternative recipe or ingredient by name
    Choose {
        name: String,
    },

    /// Record how many of an item you already have (0 forgets it)
    Have {
        name: String,
        amount: u32,
    },

    /// Go back to the service's default choices
    Reset,

    /// Forget all have-already quantities
    ResetList,

    /// Show the saved plan
    Show,

    /// Delete the saved plan for the game version
    Clear,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            game_version: self.game_version.clone(),
            database: self.database.clone(),
            request_timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let conn = Connection::open(&config.database)
        .with_context(|| format!("failed to open {}", config.database.display()))?;
    db::init_schema(&conn)?;

    let service = HttpRecipeService::from_config(&config)?;
    let session = Session::new(Arc::new(service), config.game_version.as_str());
    session.restore(db::load_preferences(&conn, &config.game_version)?);

    match cli.command {
        Commands::Items => {
            session.fetch_items().await?;
            let items = session.items().unwrap_or_default();
            if items.is_empty() {
                println!("No items for version {}", config.game_version);
            } else {
                println!("{:<40} {}", "Item", "Name");
                println!("{}", "-".repeat(60));
                for item in items {
                    println!("{:<40} {}", item.name, item.display_name);
                }
            }
        }

        Commands::Plan { lines } => {
            let parsed = parse_item_lines(&lines)?;
            for failure in &parsed.errors {
                eprintln!("skipping {}", failure);
            }
            if parsed.items.is_empty() {
                bail!("no items to plan");
            }

            session.update_selected_items(parsed.items).await?;
            print_plan(&session);
        }

        Commands::Choose { name } => {
            session.refresh().await?;
            session
                .choose(&normalize_name(&name))
                .await
                .with_context(|| format!("cannot choose '{}'", name))?;
            print_plan(&session);
        }

        Commands::Have { name, amount } => {
            session.update_have_already(&normalize_name(&name), amount).await?;
            session.refresh().await?;
            print_plan(&session);
        }

        Commands::Reset => {
            session.reset_recipe_tree().await?;
            print_plan(&session);
        }

        Commands::ResetList => {
            session.reset_shopping_list().await?;
            session.refresh().await?;
            print_plan(&session);
        }

        Commands::Show => {
            session.refresh().await?;
            print_plan(&session);
        }

        Commands::Clear => {
            db::clear_preferences(&conn, &config.game_version)?;
            println!("Cleared saved plan for {}", config.game_version);
            return Ok(());
        }
    }

    db::save_preferences(&conn, &session.snapshot())?;
    Ok(())
}

fn print_plan(session: &Session) {
    let tree = session.recipe_tree().unwrap_or_default();
    if tree.is_empty() {
        println!("Nothing planned. Run 'plan' with some items first.");
        return;
    }

    println!("Recipe tree ({}):\n", session.version());
    print!("{}", report::format_recipe_tree(&tree, 1));
    println!();

    if let Some(list) = session.shopping_list() {
        println!("{}", report::summarize_shopping_list(&list));
    }
}

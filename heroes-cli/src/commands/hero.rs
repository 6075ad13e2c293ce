//! Hero command handlers
//!
//! Handles all hero-related CLI commands: creation, paged listing,
//! viewing, updating and soft deletion.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use heroes_core::domain::hero::{Gender, Hero};
use heroes_core::dto::hero::{CreateHero, Filters, UpdateHero};
use heroes_core::dto::paging::{DEFAULT_PAGE_SIZE, ListResults, Paging};
use heroes_store::{DatabaseExecutor, HeroError, hero_repository};

/// Hero subcommands
#[derive(Subcommand)]
pub enum HeroCommands {
    /// Create a new hero
    Create {
        /// Hero name
        #[arg(short, long)]
        name: String,

        /// Superpowers (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        powers: Vec<String>,

        /// male, female or other
        #[arg(short, long)]
        gender: Gender,
    },
    /// List heroes one page at a time
    List {
        /// Only heroes with any of these superpowers (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        powers: Vec<String>,

        /// Zero-based page index
        #[arg(short, long, default_value = "0")]
        index: u64,

        /// Page size
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u64,

        /// Sort keys, `-` prefix for descending (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sort: Vec<String>,

        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get hero details
    Get {
        /// Hero ID
        id: String,

        /// Print the hero as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update some fields of a hero
    Update {
        /// Hero ID
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        /// Replace the superpowers (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        powers: Option<Vec<String>>,

        #[arg(short, long)]
        gender: Option<Gender>,
    },
    /// Soft-delete a hero
    Delete {
        /// Hero ID
        id: String,
    },
}

/// Handle hero commands
///
/// Routes hero subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The hero command to execute
/// * `db` - Executor the repository runs against
pub async fn handle_hero_command<E: DatabaseExecutor>(command: HeroCommands, db: &E) -> Result<()> {
    match command {
        HeroCommands::Create {
            name,
            powers,
            gender,
        } => create_hero(db, name, powers, gender).await,
        HeroCommands::List {
            powers,
            index,
            size,
            sort,
            json,
        } => {
            let filters = Filters {
                superpowers: powers,
            };
            let paging = Paging::new(index, size).with_sort(sort);
            list_heroes(db, filters, paging, json).await
        }
        HeroCommands::Get { id, json } => get_hero(db, &id, json).await,
        HeroCommands::Update {
            id,
            name,
            powers,
            gender,
        } => {
            let req = UpdateHero {
                name,
                superpowers: powers,
                gender,
                last_modified: None,
            };
            update_hero(db, req, &id).await
        }
        HeroCommands::Delete { id } => delete_hero(db, &id).await,
    }
}

async fn create_hero<E: DatabaseExecutor>(
    db: &E,
    name: String,
    powers: Vec<String>,
    gender: Gender,
) -> Result<()> {
    let req = CreateHero {
        name,
        superpowers: powers,
        gender,
    };

    let hero = hero_repository::create(db, req)
        .await
        .context("Failed to create hero")?;

    println!("{}", "✓ Hero created successfully!".green().bold());
    println!("  ID:     {}", hero.id.to_string().cyan());
    println!("  Name:   {}", hero.name.bold());
    if !hero.superpowers.is_empty() {
        println!("  Powers: {}", hero.superpowers.join(", ").dimmed());
    }

    Ok(())
}

async fn list_heroes<E: DatabaseExecutor>(
    db: &E,
    filters: Filters,
    paging: Paging,
    json: bool,
) -> Result<()> {
    let page = hero_repository::list(db, filters, paging)
        .await
        .context("Failed to list heroes")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.heroes.is_empty() {
        println!("{}", "No heroes found.".yellow());
    } else {
        println!(
            "{}",
            format!(
                "Showing {} of {} hero(es), page {}:",
                page.count, page.total, page.index
            )
            .bold()
        );
        println!();
        for hero in &page.heroes {
            print_hero_summary(hero);
        }
    }
    print_page_footer(&page);

    Ok(())
}

async fn get_hero<E: DatabaseExecutor>(db: &E, id: &str, json: bool) -> Result<()> {
    let hero = hero_repository::retrieve(db, id)
        .await
        .map_err(describe)
        .context("Failed to get hero")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hero)?);
    } else {
        print_hero_details(&hero);
    }

    Ok(())
}

async fn update_hero<E: DatabaseExecutor>(db: &E, req: UpdateHero, id: &str) -> Result<()> {
    if req.name.is_none() && req.superpowers.is_none() && req.gender.is_none() {
        anyhow::bail!("nothing to update: pass at least one of --name, --powers, --gender");
    }

    hero_repository::update(db, req, id)
        .await
        .map_err(describe)
        .context("Failed to update hero")?;

    println!("{}", format!("✓ Hero {} updated successfully!", id).green().bold());

    Ok(())
}

async fn delete_hero<E: DatabaseExecutor>(db: &E, id: &str) -> Result<()> {
    hero_repository::delete(db, id)
        .await
        .map_err(describe)
        .context("Failed to delete hero")?;

    println!("{}", format!("✓ Hero {} deleted successfully!", id).green().bold());

    Ok(())
}

/// Turn repository errors into user-facing messages
fn describe(err: HeroError) -> anyhow::Error {
    match err {
        HeroError::NotFound(id) => anyhow::anyhow!("Hero {} not found", id),
        HeroError::InvalidArgument(msg) => anyhow::anyhow!("Invalid argument: {}", msg),
        err @ HeroError::Persistence { .. } => err.into(),
    }
}

fn print_hero_summary(hero: &Hero) {
    println!("  {} {}", "▸".cyan(), hero.name.bold());
    println!("    ID:      {}", hero.id.to_string().dimmed());
    println!("    Gender:  {}", hero.gender.to_string().dimmed());
    if !hero.superpowers.is_empty() {
        println!("    Powers:  {}", hero.superpowers.join(", ").dimmed());
    }
    println!();
}

fn print_hero_details(hero: &Hero) {
    println!("{}", "Hero Details:".bold());
    println!("  ID:        {}", hero.id.to_string().cyan());
    println!("  Name:      {}", hero.name.bold());
    println!("  Gender:    {}", hero.gender);
    println!("  Powers:    {}", hero.superpowers.join(", "));
    println!(
        "  Created:   {}",
        hero.metadata.created.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Modified:  {}",
        hero.metadata.last_modified.format("%Y-%m-%d %H:%M:%S")
    );
}

fn print_page_footer(page: &ListResults) {
    let mut hints = Vec::new();
    if let Some(prev) = page.previous_index {
        hints.push(format!("previous: --index {}", prev));
    }
    if let Some(next) = page.next_index {
        hints.push(format!("next: --index {}", next));
    }
    if !hints.is_empty() {
        println!("{}", hints.join("  ").dimmed());
    }
}

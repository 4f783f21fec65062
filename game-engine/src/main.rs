use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use game_engine::{Config, Perfut};
use game_persistence::connection::connect_and_migrate;
use game_persistence::repositories::{CardRepository, NewCard};
use game_types::THEMES;

#[derive(Parser)]
#[command(name = "perfut")]
#[command(about = "Perfut game administration")]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring the database schema up to date
    Migrate,
    /// Load authored cards from a JSON array
    ImportCards { file: PathBuf },
    /// Open a weekly event for a date range (inclusive)
    CreateEvent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Stop a weekly event from accepting new games
    CloseEvent { event_id: i32 },
    /// Print how many cards each theme holds
    Catalog,
    /// Print the overall ranking
    Ranking {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a weekly event leaderboard
    Leaderboard {
        event_id: i32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let db = connect_and_migrate(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    match cli.command {
        Command::Migrate => {
            info!("Database at {} is up to date", config.database_url);
        }
        Command::ImportCards { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let cards: Vec<NewCard> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse cards in {}", file.display()))?;
            let imported = CardRepository::new(db).import_cards(cards).await?;
            println!("Imported {} cards", imported);
        }
        Command::CreateEvent { name, start, end } => {
            let perfut = Perfut::new(db, config);
            let event = perfut.ledger.create_weekly_event(&name, start, end).await?;
            println!(
                "Weekly event {} '{}' runs {} to {}",
                event.id, event.name, event.start_date, event.end_date
            );
        }
        Command::CloseEvent { event_id } => {
            let perfut = Perfut::new(db, config);
            perfut.ledger.close_weekly_event(event_id).await?;
            println!("Weekly event {} closed", event_id);
        }
        Command::Catalog => {
            let cards = CardRepository::new(db);
            for (theme, label) in THEMES {
                let count = cards.count_for_theme(theme).await?;
                println!("{:<20} {:<22} {:>5} cards", theme, label, count);
            }
        }
        Command::Ranking { limit } => {
            let perfut = Perfut::new(db, config);
            for entry in perfut.ledger.ranking(limit).await? {
                println!(
                    "{:>3}. {} - {} points (level {})",
                    entry.rank, entry.name, entry.total_score, entry.level
                );
            }
        }
        Command::Leaderboard { event_id, limit } => {
            let perfut = Perfut::new(db, config);
            for entry in perfut.ledger.weekly_leaderboard(event_id, limit).await? {
                println!(
                    "{:>3}. {} - {} points over {} days",
                    entry.rank, entry.name, entry.total_score, entry.days_played
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

use crate::cli::MigrateCommand;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

const DESCRIPTIONS: [&str; 2] = [
    "Core tables (users, profiles, posts, taxonomy, community)",
    "Listing and lookup indexes",
];

pub async fn run(config_path: &Path, command: Option<MigrateCommand>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;

    match command {
        None => {
            db.migrate()?;
            tracing::info!("Migrations complete");
        }
        Some(MigrateCommand::Status) => show_status(&db)?,
    }

    Ok(())
}

fn show_status(db: &Database) -> Result<()> {
    let statuses = db.migration_status()?;

    println!("\n  Migration Status\n");
    println!("  {:<10} {:<60} {}", "Version", "Description", "Applied");
    println!("  {}", "-".repeat(90));

    for (version, applied_at) in &statuses {
        let desc = DESCRIPTIONS
            .get((*version as usize).saturating_sub(1))
            .unwrap_or(&"Unknown migration");
        let applied = match applied_at {
            Some(ts) => ts.clone(),
            None => "pending".to_string(),
        };
        println!("  {:<10} {:<60} {}", format!("{:03}", version), desc, applied);
    }

    let applied_count = statuses.iter().filter(|(_, ts)| ts.is_some()).count();
    let pending_count = statuses.len() - applied_count;

    println!();
    if pending_count > 0 {
        println!(
            "  {} applied, {} pending. Run `blog migrate` to apply.",
            applied_count, pending_count
        );
    } else {
        println!("  All {} migrations applied.", applied_count);
    }
    println!();

    Ok(())
}

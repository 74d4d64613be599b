use crate::services::feedback;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

use super::FeedbackCommand;

pub async fn run(config_path: &Path, command: FeedbackCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    match command {
        FeedbackCommand::List => {
            let messages = feedback::list_feedback(&db)?;
            if messages.is_empty() {
                println!("No feedback yet.");
                return Ok(());
            }
            for message in messages {
                println!("#{} {} at {}", message.id, message, message.date);
                println!("    {}", message.message.replace('\n', "\n    "));
                println!();
            }
        }
        FeedbackCommand::Remove { id } => {
            if feedback::delete_feedback(&db, id)? {
                tracing::info!("Feedback #{} removed", id);
            } else {
                tracing::warn!("Feedback #{} not found", id);
            }
        }
    }

    Ok(())
}

use crate::models::UserRole;
use crate::{services::auth, Config, Database};
use anyhow::Result;
use std::path::Path;

use super::UserCommand;

fn parse_role(role: &str) -> Result<UserRole> {
    role.parse()
        .map_err(|_| anyhow::anyhow!("Invalid role '{}': expected admin, author or reader", role))
}

fn prompt_new_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt)?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

pub async fn run(config_path: &Path, command: UserCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    match command {
        UserCommand::Add {
            username,
            email,
            role,
            password,
        } => {
            let role = parse_role(&role)?;
            let password = match password {
                Some(p) => p,
                None => prompt_new_password("Password: ")?,
            };
            auth::create_user(&db, &username, &email, &password, role)?;
            tracing::info!("User '{}' created with role {}", username, role);
        }
        UserCommand::List => {
            let accounts = auth::list_accounts(&db)?;
            println!(
                "{:<20} {:<30} {:<25} {:<8}",
                "USERNAME", "EMAIL", "FULL NAME", "ROLE"
            );
            println!("{}", "-".repeat(86));
            for account in accounts {
                println!(
                    "{:<20} {:<30} {:<25} {:<8}",
                    account.user.username,
                    account.user.email,
                    account.profile.full_name,
                    account.user.role.to_string()
                );
            }
        }
        UserCommand::Remove { username } => {
            if auth::delete_user(&db, &username)? {
                tracing::info!("User '{}' removed", username);
            } else {
                tracing::warn!("User '{}' not found", username);
            }
        }
        UserCommand::Passwd { username } => {
            let password = prompt_new_password("New password: ")?;
            auth::update_password(&db, &username, &password)?;
            tracing::info!("Password updated for '{}'", username);
        }
        UserCommand::Role { username, role } => {
            let role = parse_role(&role)?;
            auth::set_role(&db, &username, role)?;
            tracing::info!("User '{}' is now {}", username, role);
        }
    }

    Ok(())
}

use blog_engine::cli::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path, name }) => {
            blog_engine::cli::init::run(path, name).await?;
        }
        Some(Commands::Serve { host, port }) => {
            blog_engine::cli::serve::run(&cli.config, host, port).await?;
        }
        Some(Commands::Migrate { command }) => {
            blog_engine::cli::migrate::run(&cli.config, command).await?;
        }
        Some(Commands::User { command }) => {
            blog_engine::cli::user::run(&cli.config, command).await?;
        }
        Some(Commands::Feedback { command }) => {
            blog_engine::cli::feedback::run(&cli.config, command).await?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

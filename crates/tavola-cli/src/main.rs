use clap::Parser;

use tavola_cli::args::{Cli, Commands};
use tavola_cli::client::{CliError, build_ctx_from_cli};
use tavola_cli::handlers::{collections, menu, pages, posts};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut ctx = build_ctx_from_cli(&cli)?;
    ctx.login().await?;

    match cli.command {
        Commands::Pages(cmd) => pages::handle(&ctx, cmd.action).await?,
        Commands::Collections(cmd) => collections::handle(&ctx, cmd.action).await?,
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
        Commands::Menu(cmd) => menu::handle(&ctx, cmd.action).await?,
    }

    Ok(())
}

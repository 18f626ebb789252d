mod app;
mod chat;
mod cli;
mod completion;
mod config;
mod export;
mod logging;
mod notify;
mod pipeline;
mod render;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use completion::{CompletionClient, HttpCompletionClient, WireMessage};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from(cli.settings);

    match cli.command {
        Some(Commands::Ask { message, raw }) => {
            logging::init(&config.log_file)?;
            ask(&config, message.join(" "), raw).await?;
        }
        Some(Commands::Config) => {
            println!("{}", config);
        }
        None => {
            logging::init(&config.log_file)?;
            tui::run(config).await?;
        }
    }

    Ok(())
}

/// Send a single user message and print the reply
async fn ask(config: &Config, prompt: String, raw: bool) -> Result<()> {
    let client = HttpCompletionClient::new(config.endpoint.clone());
    let history = [WireMessage {
        role: chat::Role::User,
        content: prompt,
    }];

    let reply = client
        .complete(&history)
        .await
        .with_context(|| format!("Completion request to {} failed", client.url()))?;

    if raw {
        println!("{}", reply);
    } else {
        for line in render::blocks_to_lines(&render::markdown::parse(&reply)) {
            let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
            println!("{}", text);
        }
    }

    Ok(())
}

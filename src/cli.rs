use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    /// Optional command to run; without one the chat UI starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Completion endpoint that receives the conversation
    #[arg(
        long,
        global = true,
        env = "PARLEY_ENDPOINT_URL",
        default_value = "http://localhost:8080/api/chat"
    )]
    pub endpoint: String,

    /// Directory exported chats are written to
    #[arg(long, global = true, env = "PARLEY_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// File that receives log output
    #[arg(long, global = true, env = "PARLEY_LOG_FILE", default_value = "parley.log")]
    pub log_file: PathBuf,

    /// Seconds a notification stays on screen
    #[arg(long, global = true, env = "PARLEY_TOAST_SECS", default_value_t = 4)]
    pub toast_secs: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a one-off message and print the reply
    Ask {
        /// The message to send
        #[arg(required = true)]
        message: Vec<String>,

        /// Print the reply as raw markdown instead of rendered text
        #[arg(short, long)]
        raw: bool,
    },

    /// Print the effective configuration
    Config,
}

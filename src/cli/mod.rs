//! CLI entry point for chatdeck.

pub mod auth;
pub mod render;
pub mod repl;

use clap::{Parser, Subcommand};

/// chatdeck terminal chat client
#[derive(Parser, Debug)]
#[command(name = "chatdeck", version, about = "Terminal chat client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account management
    Auth(AuthArgs),
    /// Open the interactive chat
    Chat(ChatArgs),
    /// List stored conversations
    Sessions,
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Create an account
    Signup(SignupArgs),
    /// Sign in with email and password
    Login(LoginArgs),
    /// Show who is signed in
    Status,
    /// Sign out
    Logout,
}

/// Arguments for `chatdeck auth signup`.
#[derive(Parser, Debug)]
pub struct SignupArgs {
    /// Account email
    pub email: String,

    /// Name shown in the chat header
    #[arg(short, long)]
    pub name: String,
}

/// Arguments for `chatdeck auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    pub email: String,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Skip the sign-in check
    #[arg(long)]
    pub no_auth: bool,

    /// Keep conversations in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Override the generation endpoint
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

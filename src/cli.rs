use clap::{Parser, Subcommand};

/// modgate — image moderation gateway
#[derive(Parser)]
#[command(name = "modgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind (overrides MODGATE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a new token. Also the admin bootstrap path: the first admin
    /// token can only be created here, not over HTTP.
    Create {
        /// Grant admin privileges
        #[arg(long)]
        admin: bool,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },
    /// List active tokens
    List,
    /// Revoke a token
    Revoke {
        #[arg(long)]
        secret: String,
    },
}

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "tuntool", version, about = "Open and close named SSH local port forwards", long_about = None)]
pub struct Cli {
    /// config file holding the ssh defaults and registered remotes
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register a remote interactively
    Add,
    /// List registered remotes and whether their tunnel is up
    Status,
    /// Start the tunnel for a remote
    Open { name: String },
    /// Stop the tunnel for a remote
    Close { name: String },
}

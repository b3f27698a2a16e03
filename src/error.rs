use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[source] serde_json::Error),
    #[error("failed to read input: {0}")]
    Prompt(#[source] io::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error(transparent)]
    Tunnel(#[from] TunnelError),
    #[error("command task failed: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("process listing failed: {0}")]
    Listing(String),
    #[error("failed to start ssh: {0}")]
    Spawn(#[source] io::Error),
    #[error("ssh exited with {0}")]
    SshExited(String),
    #[error("ssh was interrupted")]
    Interrupted,
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

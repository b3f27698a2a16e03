pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod process;
pub mod prompt;
pub mod ssh_args;
pub mod tunnel;

use std::future::Future;
use std::io::{self, Write};

use tokio::task::JoinHandle;

pub use cli::{Cli, Command};
pub use config::{Config, Remote};
pub use error::{Error, TunnelError};

use commands::{Session, Style};
use process::SystemProcesses;
use prompt::Console;
use tunnel::TunnelController;

pub async fn run(cli: Cli) -> Result<(), Error> {
    run_with(cli, tokio::signal::ctrl_c()).await
}

/// Like [`run`], with `interrupt` resolving when the user asks to stop.
pub async fn run_with<I>(cli: Cli, interrupt: I) -> Result<(), Error>
where
    I: Future<Output = io::Result<()>>,
{
    let config_path = config::expand_config_path(&cli.config);
    let command = cli.command;

    // Prompts and ssh block on the terminal; keep them off the runtime so Ctrl-C is still seen.
    let task = tokio::task::spawn_blocking(move || {
        let mut prompter = Console::stdio();
        let mut out = io::stdout();
        let mut session = Session {
            config_path: &config_path,
            controller: TunnelController::new(SystemProcesses),
            prompter: &mut prompter,
            out: &mut out,
            style: Style::detect(),
        };
        session.execute(command)
    });

    finish_or_interrupt(task, interrupt, &mut io::stdout()).await
}

async fn finish_or_interrupt<I>(
    task: JoinHandle<Result<(), Error>>,
    interrupt: I,
    out: &mut dyn Write,
) -> Result<(), Error>
where
    I: Future<Output = io::Result<()>>,
{
    // The interrupt wins ties: Ctrl-C also reaches a foreground ssh, which then
    // fails at about the same moment.
    tokio::select! {
        biased;
        _ = interrupt => {}
        res = task => match res.map_err(|e| Error::Join(e.to_string()))? {
            Err(Error::Tunnel(TunnelError::Interrupted)) => {}
            other => return other,
        },
    }

    writeln!(out, "\nOperation interrupted.")?;
    Ok(())
}

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::cli::Command;
use crate::config::{load_or_init, save_config, Config, Remote};
use crate::error::Error;
use crate::process::ProcessControl;
use crate::prompt::{ask_until, Prompter};
use crate::tunnel::{CloseOutcome, OpenOutcome, TunnelController};

const BOLD_WHITE: &str = "\x1b[1;37m";
const GREEN: &str = "\x1b[0;32m";
const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Whether status labels get ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn detect() -> Self {
        Style {
            color: io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Style { color: false }
    }

    fn status_line(&self, name: &str, open: bool) -> String {
        let label = if open { "OPENED" } else { "CLOSED" };
        if !self.color {
            return format!("{name}: {label}");
        }
        let label_color = if open { GREEN } else { BOLD_RED };
        format!("{BOLD_WHITE}{name}: {label_color}{label}{RESET}")
    }
}

/// Everything one invocation of the tool works with.
pub struct Session<'a, P> {
    pub config_path: &'a Path,
    pub controller: TunnelController<P>,
    pub prompter: &'a mut dyn Prompter,
    pub out: &'a mut dyn Write,
    pub style: Style,
}

impl<P: ProcessControl> Session<'_, P> {
    /// Load (or create) the config, then run `command` against it.
    pub fn execute(&mut self, command: Option<Command>) -> Result<(), Error> {
        let mut config = load_or_init(self.config_path, &mut *self.prompter, &mut *self.out)?;

        match command {
            Some(Command::Add) => self.add(&mut config),
            Some(Command::Status) => self.status(&config),
            Some(Command::Open { name }) if !name.trim().is_empty() => self.open(&config, &name),
            Some(Command::Close { name }) if !name.trim().is_empty() => self.close(&config, &name),
            _ => Ok(()),
        }
    }

    fn add(&mut self, config: &mut Config) -> Result<(), Error> {
        let name = self.ask_field("remote name", |v| !v.is_empty())?;
        let local_port = self.ask_field("local port", is_port)?;
        let remote_host = self.ask_field("remote host", |v| !v.is_empty())?;
        let remote_port = self.ask_field("remote port", is_port)?;

        let remote = Remote {
            local_port,
            remote_host,
            remote_port,
        };
        if let Some(previous) = config.remotes.insert(name.clone(), remote) {
            tracing::warn!(remote = %name, previous = %previous.forward_spec(), "replaced existing remote");
        }
        save_config(self.config_path, config)?;

        writeln!(self.out, "Remote with name \"{name}\" was successfully registered.")?;
        Ok(())
    }

    fn ask_field(&mut self, label: &str, accept: fn(&str) -> bool) -> Result<String, Error> {
        ask_until(&mut *self.prompter, &format!("Enter {label}: "), accept).map_err(Error::Prompt)
    }

    fn status(&mut self, config: &Config) -> Result<(), Error> {
        writeln!(self.out, "Listing the registered remotes:")?;
        for (name, remote) in &config.remotes {
            let open = self.controller.find_pid(remote).is_some();
            writeln!(self.out, "{}", self.style.status_line(name, open))?;
        }
        Ok(())
    }

    fn open(&mut self, config: &Config, name: &str) -> Result<(), Error> {
        let Some(remote) = self.lookup(config, name)? else {
            return Ok(());
        };

        match self
            .controller
            .open(remote, &config.ssh_user, &config.ssh_host_ip)?
        {
            OpenOutcome::AlreadyOpen { pid } => {
                tracing::debug!(remote = %name, pid, "tunnel already running");
                writeln!(self.out, "Tunnel to remote \"{name}\" is already open.")?;
            }
            OpenOutcome::Opened => {
                writeln!(self.out, "Tunnel to remote \"{name}\" was successfully opened.")?;
            }
        }
        Ok(())
    }

    fn close(&mut self, config: &Config, name: &str) -> Result<(), Error> {
        let Some(remote) = self.lookup(config, name)? else {
            return Ok(());
        };

        match self.controller.close(remote)? {
            CloseOutcome::NotOpen => {
                writeln!(self.out, "Tunnel to remote \"{name}\" is not open.")?;
            }
            CloseOutcome::Closed { .. } => {
                writeln!(self.out, "Tunnel to remote \"{name}\" was successfully closed.")?;
            }
        }
        Ok(())
    }

    fn lookup<'c>(&mut self, config: &'c Config, name: &str) -> Result<Option<&'c Remote>, Error> {
        let remote = config.remotes.get(name);
        if remote.is_none() {
            writeln!(self.out, "Remote \"{name}\" was not found.")?;
        }
        Ok(remote)
    }
}

// A TCP port as ssh accepts it in -L: 1..=65535, plain digits, no leading zero.
fn is_port(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
        && !value.starts_with('0')
        && value.parse::<u16>().is_ok()
}

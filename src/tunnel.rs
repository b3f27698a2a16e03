use crate::config::Remote;
use crate::error::TunnelError;
use crate::process::{find_in_listing, ProcessControl};
use crate::ssh_args::build_invocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    AlreadyOpen { pid: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed { pid: u32 },
    NotOpen,
}

/// Opens, closes and inspects tunnels. A tunnel counts as open while any
/// process command line carries its forward spec, whoever started it.
pub struct TunnelController<P> {
    processes: P,
}

impl<P: ProcessControl> TunnelController<P> {
    pub fn new(processes: P) -> Self {
        TunnelController { processes }
    }

    /// Pid of the process forwarding `remote`, if any. A failed listing counts as none.
    pub fn find_pid(&self, remote: &Remote) -> Option<u32> {
        let spec = remote.forward_spec();
        match self.processes.listing() {
            Ok(listing) => find_in_listing(&listing, &spec),
            Err(e) => {
                tracing::warn!(forward = %spec, error = %e, "treating tunnel as closed");
                None
            }
        }
    }

    pub fn open(
        &self,
        remote: &Remote,
        ssh_user: &str,
        ssh_host_ip: &str,
    ) -> Result<OpenOutcome, TunnelError> {
        if let Some(pid) = self.find_pid(remote) {
            return Ok(OpenOutcome::AlreadyOpen { pid });
        }

        let inv = build_invocation(remote, ssh_user, ssh_host_ip);
        self.processes.spawn(&inv)?;
        tracing::info!(
            forward = %remote.forward_spec(),
            via = %ssh_host_ip,
            "tunnel opened"
        );
        Ok(OpenOutcome::Opened)
    }

    pub fn close(&self, remote: &Remote) -> Result<CloseOutcome, TunnelError> {
        let Some(pid) = self.find_pid(remote) else {
            return Ok(CloseOutcome::NotOpen);
        };

        self.processes.terminate(pid)?;
        tracing::info!(forward = %remote.forward_spec(), pid, "tunnel closed");
        Ok(CloseOutcome::Closed { pid })
    }
}

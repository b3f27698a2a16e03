use crate::config::Remote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for a in &self.args {
            line.push(' ');
            line.push_str(a);
        }
        line
    }
}

// "user@host", or the bare host when no user is configured (ssh then uses its own default)
fn destination(ssh_user: &str, ssh_host_ip: &str) -> String {
    if ssh_user.is_empty() {
        ssh_host_ip.to_string()
    } else {
        format!("{}@{}", ssh_user, ssh_host_ip)
    }
}

pub fn build_invocation(remote: &Remote, ssh_user: &str, ssh_host_ip: &str) -> Invocation {
    let mut ssh_args: Vec<String> = Vec::new();

    // Go to background once authenticated
    ssh_args.push("-f".to_string());
    // No remote command; port-forward only
    ssh_args.push("-N".to_string());
    // Fail (and exit non-zero before backgrounding) if the local port cannot be bound
    ssh_args.push("-o".to_string());
    ssh_args.push("ExitOnForwardFailure=yes".to_string());

    ssh_args.push("-L".to_string());
    ssh_args.push(remote.forward_spec());

    // Target
    ssh_args.push(destination(ssh_user, ssh_host_ip));

    Invocation {
        program: "ssh".to_string(),
        args: ssh_args,
    }
}
